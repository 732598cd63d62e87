#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("scaleby_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::env;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    use scaleby_engine::Engine;
    use scaleby_engine::geom::{BBox, Point3, Transform, Vec3};
    use scaleby_engine::host::ImageInput;
    use scaleby_engine::params::{ParamMap, ParamValue};
    use scaleby_engine::scene::{EntityRef, RigidObject, Scene};
    use scaleby_engine::tools::{SelectionKind, ToolKind, ToolOutcome, ToolRegistry};

    const USAGE: &str = "\
scaleby_cli

USAGE:
  scaleby_cli list
  scaleby_cli defaults <tool>
  scaleby_cli run <tool> [--grid N] [--image PATH] [--set key=value]... [--obj PATH] [--overwrite]

NOTES:
  - <tool> is a key (image, attractor, power, sine, pushpull, vertices) or a tool title.
  - `run` builds an N x N demo scene suited to the tool: boxes for object tools,
    square faces for pushpull and a ruled grid of edges for vertices.
  - The attractor tool adds a component named 'A' at one corner of the grid.
  - Values given with --set use dialog text, e.g. --set \"kind=Rotation about BLUE\" --set multiplier=2'.
";

    /// Spacing between demo entities, in inches.
    const PITCH: f64 = 24.0;
    const BOX_SIZE: f64 = 12.0;

    pub fn run() -> Result<(), String> {
        let mut args = Args::new(env::args().skip(1).collect());
        let Some(cmd) = args.next() else {
            print!("{USAGE}");
            return Ok(());
        };

        match cmd.as_str() {
            "help" | "-h" | "--help" => {
                print!("{USAGE}");
                Ok(())
            }
            "list" => {
                list_tools();
                Ok(())
            }
            "defaults" => {
                let tool = args.value("<tool>")?;
                print_defaults(&tool)
            }
            "run" => run_command(&mut args),
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn list_tools() {
        for tool in ToolKind::ALL {
            let image = if tool.needs_image() { " (image)" } else { "" };
            println!("{:<10} {}{image}", tool.key(), tool.title());
        }
    }

    fn print_defaults(tool: &str) -> Result<(), String> {
        let engine = Engine::new();
        let defaults = engine.defaults(tool).map_err(|e| e.to_string())?;
        let kind = ToolRegistry::default()
            .lookup(tool)
            .map_err(|e| e.to_string())?;
        for field in kind.spec().fields {
            let value = defaults
                .get(&field.key)
                .map_or_else(String::new, ToString::to_string);
            println!("{:<20} {:<40} {value}", field.key, field.prompt);
            if !field.choices.is_empty() {
                println!("{:<20} choices: {}", "", field.choices.join(", "));
            }
        }
        Ok(())
    }

    fn run_command(args: &mut Args) -> Result<(), String> {
        let tool_name = args.value("<tool>")?;
        let tool = ToolRegistry::default()
            .lookup(&tool_name)
            .map_err(|e| e.to_string())?;

        let mut grid = 3_usize;
        let mut image: Option<PathBuf> = None;
        let mut obj: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut params = ParamMap::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--grid" => {
                    let raw = args.value("--grid")?;
                    grid = raw
                        .parse()
                        .map_err(|_| format!("--grid expects a positive integer, got `{raw}`"))?;
                    if grid == 0 {
                        return Err("--grid must be at least 1".to_owned());
                    }
                }
                "--image" => image = Some(PathBuf::from(args.value("--image")?)),
                "--obj" => obj = Some(PathBuf::from(args.value("--obj")?)),
                "--overwrite" => overwrite = true,
                "--set" => {
                    let pair = args.value("--set")?;
                    let (key, value) = pair
                        .split_once('=')
                        .ok_or_else(|| format!("--set expects key=value, got `{pair}`"))?;
                    params.insert(key.trim().to_owned(), ParamValue::from(value.trim()));
                }
                other => return Err(format!("unknown flag `{other}`\n\n{USAGE}")),
            }
        }

        if tool.needs_image() && image.is_none() {
            return Err(format!("{} needs --image PATH", tool.key()));
        }

        let (scene, selection) = demo_scene(tool, grid)?;
        let mut engine = Engine::new();
        engine.set_scene(scene);

        let outcome = engine
            .run(tool.key(), &selection, &params, image.map(ImageInput::Path))
            .map_err(|e| e.to_string())?;

        match outcome {
            ToolOutcome::Cancelled => {
                println!("{}: cancelled", tool.title());
                return Ok(());
            }
            ToolOutcome::Committed(report) => {
                println!("{}: {} processed", report.title, report.batch.processed);
                if report.attractors > 0 {
                    println!("attractors: {}", report.attractors);
                }
                for (entity, scalar) in &report.batch.scalars {
                    println!("{entity:<14} {scalar:.6}");
                }
            }
        }

        if let Some(path) = obj {
            write_obj_file(&path, engine.scene(), tool.key(), overwrite)?;
            println!("wrote {}", path.display());
        }
        Ok(())
    }

    fn demo_scene(tool: ToolKind, grid: usize) -> Result<(Scene, Vec<EntityRef>), String> {
        let mut scene = Scene::new();
        let mut selection = Vec::new();
        #[allow(clippy::cast_precision_loss)]
        let cell = |i: usize| i as f64 * PITCH;

        match tool.selection() {
            SelectionKind::Objects => {
                let bounds = BBox::new(Point3::ORIGIN, Point3::new(BOX_SIZE, BOX_SIZE, BOX_SIZE));
                for row in 0..grid {
                    for col in 0..grid {
                        let at = Transform::translate(Vec3::new(cell(col), cell(row), 0.0));
                        let id = scene.add_object(RigidObject::group("box", at, bounds));
                        selection.push(id.into());
                    }
                }
                if tool == ToolKind::AttractorTransform {
                    let corner = Transform::translate(Vec3::new(-PITCH, -PITCH, 0.0));
                    let id = scene.add_object(RigidObject::component("A", corner));
                    selection.push(id.into());
                }
            }
            SelectionKind::Faces => {
                for row in 0..grid {
                    for col in 0..grid {
                        let (x, y) = (cell(col), cell(row));
                        let vertices = [(0.0, 0.0), (BOX_SIZE, 0.0), (BOX_SIZE, BOX_SIZE), (0.0, BOX_SIZE)]
                            .into_iter()
                            .map(|(dx, dy)| scene.add_point(Point3::new(x + dx, y + dy, 0.0)))
                            .collect();
                        let id = scene.add_region(vertices).map_err(|e| e.to_string())?;
                        selection.push(id.into());
                    }
                }
            }
            SelectionKind::Edges => {
                for row in 0..grid {
                    let points: Vec<_> = (0..=grid)
                        .map(|col| scene.add_point(Point3::new(cell(col), cell(row), 0.0)))
                        .collect();
                    for pair in points.windows(2) {
                        let id = scene.add_edge(pair[0], pair[1]).map_err(|e| e.to_string())?;
                        selection.push(id.into());
                    }
                }
            }
        }
        Ok((scene, selection))
    }

    fn write_obj_file(path: &Path, scene: &Scene, name: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        let err = |e: std::io::Error| format!("write obj: {e}");

        writeln!(w, "# scaleby-engine scaleby_cli").map_err(err)?;
        writeln!(w, "o {name}").map_err(err)?;

        for p in scene.points() {
            writeln!(w, "v {} {} {}", p.x, p.y, p.z).map_err(err)?;
        }
        for region in scene.regions() {
            write!(w, "f").map_err(err)?;
            for id in &region.vertices {
                write!(w, " {}", id.0 + 1).map_err(err)?;
            }
            writeln!(w).map_err(err)?;
        }
        for edge in scene.edges() {
            writeln!(w, "l {} {}", edge.start.0 + 1, edge.end.0 + 1).map_err(err)?;
        }

        // Boxes follow the points, so their indices start after them.
        let mut base = scene.points().len();
        for object in scene.objects() {
            let Some(bounds) = object.local_bounds else {
                continue;
            };
            writeln!(w, "g {}", object.name).map_err(err)?;
            for corner in bounds.corners() {
                let p = object.transform.apply_point(corner);
                writeln!(w, "v {} {} {}", p.x, p.y, p.z).map_err(err)?;
            }
            for face in BOX_FACES {
                let [a, b, c, d] = face.map(|i| base + i + 1);
                writeln!(w, "f {a} {b} {c} {d}").map_err(err)?;
            }
            base += 8;
        }

        w.flush().map_err(err)
    }

    /// Quads over `BBox::corners`, wound outward.
    const BOX_FACES: [[usize; 4]; 6] = [
        [0, 2, 3, 1],
        [4, 5, 7, 6],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 4, 6, 2],
        [1, 3, 7, 5],
    ];

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}

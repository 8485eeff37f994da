#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("kernel_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use nodegeo_engine::geom::{
        Axis, BendDiagnostics, BendOptions, ElementKind, Interpolation, Metric, Point3,
        PointGrid, SelectOptions, SelectionCriterion, SelectionMasks, SolidTopology, Vec3,
        bend_along_surface, select_elements,
    };
    use std::f64::consts::PI;
    use std::fmt::Write as _;
    use std::fs;
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"kernel_cli (nodegeo-engine)

USAGE:
  kernel_cli list
  kernel_cli run <scenario|all> [options]

SCENARIOS:
  bend_flat
  bend_wave
  select_cuboid_faces
  select_cylinder_edges

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.snap to this dir
  --snap <path>      Write the snapshot to a file (single scenario only)
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if out_dir.is_some() && snap_path.is_some() {
            return Err("use either --out-dir or --snap (not both)".to_string());
        }

        let scenarios: Vec<Scenario> = if scenario_name == "all" {
            if snap_path.is_some() {
                return Err("`run all` cannot write to a single --snap file".to_string());
            }
            Scenario::ALL.to_vec()
        } else {
            vec![Scenario::from_str(&scenario_name).ok_or_else(|| unknown_scenario(&scenario_name))?]
        };

        for scenario in scenarios {
            let snapshot = run_scenario(scenario)?;
            if let Some(dir) = out_dir.as_deref() {
                let path = dir.join(format!("{}.snap", scenario.name()));
                write_text_file(&path, &snapshot, overwrite)?;
                eprintln!("wrote {}", path.display());
            } else if let Some(path) = snap_path.as_deref() {
                write_text_file(path, &snapshot, overwrite)?;
                eprintln!("wrote {}", path.display());
            } else {
                print!("{snapshot}");
            }
        }

        Ok(())
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = format!("unknown scenario `{name}`\n\navailable scenarios:\n");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text))
            .map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    // ========================================================================
    // Snapshot formatting
    // ========================================================================

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == 0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_scalar_line(out: &mut String, key: &str, value: f64) {
        let _ = write!(out, "{key} ");
        write_f64(out, value);
        out.push('\n');
    }

    fn write_vec3_line(out: &mut String, prefix: &str, v: Point3) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v.x);
        out.push(' ');
        write_f64(out, v.y);
        out.push(' ');
        write_f64(out, v.z);
        out.push('\n');
    }

    fn write_grid(out: &mut String, grid: &PointGrid) {
        let (rows, columns) = grid.shape();
        let _ = writeln!(out, "grid.shape {rows} {columns}");
        for (i, row) in grid.iter_rows().enumerate() {
            for (j, p) in row.iter().enumerate() {
                write_vec3_line(out, &format!("p.{i}.{j}"), *p);
            }
        }
    }

    fn write_bend_diagnostics(out: &mut String, diag: &BendDiagnostics) {
        let _ = writeln!(out, "bend_diag.point_count {}", diag.point_count);
        let _ = writeln!(
            out,
            "bend_diag.surface_shape {} {}",
            diag.surface_shape.0, diag.surface_shape.1
        );
        write_scalar_line(out, "bend_diag.scale", diag.scale);
        write_scalar_line(out, "bend_diag.min_displacement", diag.min_displacement);
        write_scalar_line(out, "bend_diag.max_displacement", diag.max_displacement);
    }

    fn write_masks(out: &mut String, masks: &SelectionMasks) {
        for kind in ElementKind::ALL {
            let bits: String = masks
                .mask(kind)
                .iter()
                .map(|&selected| if selected { '1' } else { '0' })
                .collect();
            let _ = writeln!(
                out,
                "mask.{} {} {bits}",
                kind.name().to_ascii_lowercase(),
                masks.count(kind)
            );
        }
    }

    // ========================================================================
    // Scenarios
    // ========================================================================

    #[derive(Debug, Clone, Copy)]
    enum Scenario {
        BendFlat,
        BendWave,
        SelectCuboidFaces,
        SelectCylinderEdges,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::BendFlat,
            Scenario::BendWave,
            Scenario::SelectCuboidFaces,
            Scenario::SelectCylinderEdges,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::BendFlat => "bend_flat",
                Scenario::BendWave => "bend_wave",
                Scenario::SelectCuboidFaces => "select_cuboid_faces",
                Scenario::SelectCylinderEdges => "select_cylinder_edges",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|s| s.name() == name)
        }
    }

    fn run_scenario(scenario: Scenario) -> Result<String, String> {
        let mut out = String::new();
        let _ = writeln!(out, "scenario {}", scenario.name());

        match scenario {
            Scenario::BendFlat => {
                let surface = grid(3, 3, |u, v| Point3::new(2.0 * u, 2.0 * v, 0.0))?;
                let source = grid(3, 4, |u, v| Point3::new(u, v, 0.25 * u))?;
                let options = BendOptions::default()
                    .interpolation(Interpolation::Linear)
                    .metric(Metric::Points);
                bend_to_snapshot(&mut out, &source, &surface, options)?;
            }
            Scenario::BendWave => {
                let surface = grid(5, 5, |u, v| {
                    Point3::new(4.0 * u, 4.0 * v, 0.5 * (PI * u).sin() * (PI * v).cos())
                })?;
                let source = grid(4, 4, |u, v| Point3::new(u, v, 0.1))?;
                let options = BendOptions::default()
                    .orientation(Axis::Z)
                    .auto_scale(true);
                bend_to_snapshot(&mut out, &source, &surface, options)?;
            }
            Scenario::SelectCuboidFaces => {
                let solid = SolidTopology::cuboid(
                    Point3::new(-1.0, -1.0, -1.0),
                    Point3::new(1.0, 1.0, 1.0),
                )
                .map_err(|e| e.to_string())?;
                let options = SelectOptions::new(ElementKind::Faces, SelectionCriterion::Normal)
                    .direction(Vec3::new(1.0, 1.0, 0.0))
                    .percent(30.0);
                select_to_snapshot(&mut out, &solid, &options)?;
            }
            Scenario::SelectCylinderEdges => {
                let solid = SolidTopology::cylinder(Point3::ORIGIN, 1.0, 2.0)
                    .map_err(|e| e.to_string())?;
                let options = SelectOptions::new(ElementKind::Edges, SelectionCriterion::Direction)
                    .direction(Vec3::Z)
                    .percent(0.0);
                select_to_snapshot(&mut out, &solid, &options)?;
            }
        }

        Ok(out)
    }

    /// Grid whose generator receives normalized row/column parameters.
    fn grid(
        rows: usize,
        columns: usize,
        f: impl Fn(f64, f64) -> Point3,
    ) -> Result<PointGrid, String> {
        PointGrid::from_fn(rows, columns, |i, j| {
            f(i as f64 / (rows - 1) as f64, j as f64 / (columns - 1) as f64)
        })
        .map_err(|e| e.to_string())
    }

    fn bend_to_snapshot(
        out: &mut String,
        source: &PointGrid,
        surface: &PointGrid,
        options: BendOptions,
    ) -> Result<(), String> {
        let _ = writeln!(
            out,
            "options {} {} {} auto_scale={}",
            options.orientation,
            options.interpolation.name(),
            options.metric.name(),
            options.auto_scale
        );
        let (bent, diag) =
            bend_along_surface(source, surface, options).map_err(|e| e.to_string())?;
        write_bend_diagnostics(out, &diag);
        write_grid(out, &bent);
        eprintln!("bend: points={} scale={:.4}", diag.point_count, diag.scale);
        Ok(())
    }

    fn select_to_snapshot(
        out: &mut String,
        solid: &SolidTopology,
        options: &SelectOptions,
    ) -> Result<(), String> {
        let _ = writeln!(
            out,
            "options {} by {} percent={} partial={}",
            options.kind, options.criterion, options.percent, options.include_partial
        );
        let _ = writeln!(
            out,
            "solid {} {} {}",
            solid.vertices().len(),
            solid.edges().len(),
            solid.faces().len()
        );
        let masks = select_elements(solid, options).map_err(|e| e.to_string())?;
        write_masks(out, &masks);
        eprintln!(
            "select: {} {} selected",
            masks.count(options.kind),
            options.kind
        );
        Ok(())
    }

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
            self.next().ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}

use std::env;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("psalms.rs");

    let mut code = String::new();
    code.push_str("/// Embedded playlist files, keyed by path relative to `psalms/`\n");
    code.push_str("pub static FILES: &[(&str, &str)] = &[\n");

    let psalms_dir = Path::new("psalms");

    if psalms_dir.exists() {
        let mut entries: Vec<_> = WalkDir::new(psalms_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .collect();
        entries.sort_by(|a, b| a.path().cmp(b.path()));

        for entry in entries {
            let path = entry.path();
            let relative_path = path.strip_prefix(psalms_dir).unwrap();
            let name = relative_path.to_string_lossy().replace('\\', "/");

            if let Ok(content) = fs::read_to_string(path) {
                code.push_str(&format!("    ({:?}, {:?}),\n", name, content));
            }
        }
    }

    code.push_str("];\n");

    fs::write(&dest_path, code).unwrap();

    println!("cargo:rerun-if-changed=psalms");
}

use std::fs;
use std::path::Path;

pub fn run_demo(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name);
    let source = fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path:?}: {e}"));

    let mut output = Vec::new();
    usl::run(&source, Box::new(&mut output)).unwrap_or_else(|e| panic!("running {name}: {e}"));
    String::from_utf8(output).unwrap()
}

use std::fs;
use std::path::{Path, PathBuf};

use render::config;
use render::error::Error;
use render::plan::Payload;
use render::processor::{collect, collect_each_file, is_template_path, render_output_path, strip_template_suffix};
use render::renderer::MiniJinjaRenderer;
use serde_json::json;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_is_template_path() {
    assert!(is_template_path("template.html.tmpl"));
    assert!(is_template_path("file.txt.tmpl"));
    assert!(!is_template_path("regular.html"));
    assert!(!is_template_path("file.tmpltxt"));
}

#[test]
fn test_strip_template_suffix() {
    assert_eq!(
        strip_template_suffix(Path::new("output/template.html.tmpl")),
        PathBuf::from("output/template.html")
    );
    assert_eq!(
        strip_template_suffix(Path::new("output/regular.txt")),
        PathBuf::from("output/regular.txt")
    );
}

#[test]
fn test_collect_plans_without_writing() {
    let template = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(template.path(), "README.md.tmpl", "# {{ name }}");
    write(template.path(), "src/lib.rs", "pub fn x() {}");
    write(template.path(), ".render.yaml", "paths: {}\n");
    write(template.path(), "nested/.render.yaml", "kept: true\n");

    let renderer = MiniJinjaRenderer::new();
    let plan = collect(template.path(), out.path(), &json!({"name": "demo"}), &renderer, None).unwrap();

    let outputs: Vec<_> = plan
        .outputs
        .iter()
        .map(|o| (o.source_path.as_str(), o.output_path.strip_prefix(out.path()).unwrap().to_path_buf()))
        .collect();
    assert_eq!(
        outputs,
        vec![
            ("README.md.tmpl", PathBuf::from("README.md")),
            ("nested/.render.yaml", PathBuf::from("nested/.render.yaml")),
            ("src/lib.rs", PathBuf::from("src/lib.rs")),
        ]
    );
    assert_eq!(plan.outputs[0].payload, Payload::Content(b"# demo".to_vec()));
    assert_eq!(plan.outputs[0].permissions, 0o644);
    assert!(plan.outputs[2].is_copy());
    assert_eq!(plan.directories.len(), 2);
    assert!(fs::read_dir(out.path()).unwrap().next().is_none());
}

#[test]
fn test_collect_applies_control_file() {
    let template = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(template.path(), "model.go.tmpl", "package {{ name }}");
    write(template.path(), "settings.json", "{}");
    write(
        template.path(),
        ".render.yaml",
        "paths:\n  model.go.tmpl: \"{{ name }}.go.tmpl\"\n  settings.json:\n    path: settings.json\n    overwrite: false\n",
    );
    let parsed = config::load(template.path()).unwrap().unwrap();

    let renderer = MiniJinjaRenderer::new();
    let plan = collect(template.path(), out.path(), &json!({"name": "user"}), &renderer, Some(&parsed)).unwrap();

    assert_eq!(plan.outputs[0].output_path, out.path().join("user.go"));
    assert!(plan.outputs[0].overwrite);
    assert_eq!(plan.outputs[1].output_path, out.path().join("settings.json"));
    assert!(!plan.outputs[1].overwrite);
}

#[test]
fn test_collect_render_error_returns_no_plan() {
    let template = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(template.path(), "a.tmpl", "{{ ok }}");
    write(template.path(), "b.tmpl", "{{ broken");

    let renderer = MiniJinjaRenderer::new();
    let result = collect(template.path(), out.path(), &json!({}), &renderer, None);
    assert!(matches!(result, Err(Error::RenderError { .. })));
}

#[cfg(unix)]
#[test]
fn test_collect_preserves_copy_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let template = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(template.path(), "run.sh", "#!/bin/sh\n");
    fs::set_permissions(template.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();

    let renderer = MiniJinjaRenderer::new();
    let plan = collect(template.path(), out.path(), &json!({}), &renderer, None).unwrap();
    assert_eq!(plan.outputs[0].permissions, 0o755);
}

#[cfg(unix)]
#[test]
fn test_collect_drops_special_permission_bits() {
    use std::os::unix::fs::PermissionsExt;

    let template = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(template.path(), "tool", "#!/bin/sh\n");
    fs::set_permissions(template.path().join("tool"), fs::Permissions::from_mode(0o4755)).unwrap();

    let renderer = MiniJinjaRenderer::new();
    let plan = collect(template.path(), out.path(), &json!({}), &renderer, None).unwrap();
    assert_eq!(plan.outputs[0].permissions, 0o755);
}

#[test]
fn test_collect_each_file_labels_items() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "user.txt", "{{ name }}");
    let items = vec![json!({"id": 1, "name": "a"}), json!({"id": 2, "name": "b"})];

    let renderer = MiniJinjaRenderer::new();
    let plan = collect_each_file(&dir.path().join("user.txt"), "out/{{ id }}.txt", &items, &renderer, |p| {
        Ok(PathBuf::from("/root").join(p))
    })
    .unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.outputs[1].source_path, "[1]");
    assert_eq!(plan.outputs[1].output_path, PathBuf::from("/root/out/2.txt"));
    assert_eq!(plan.outputs[1].payload, Payload::Content(b"b".to_vec()));
}

#[test]
fn test_render_output_path() {
    let renderer = MiniJinjaRenderer::new();
    assert_eq!(render_output_path(&renderer, "  {{ id }}.txt\n", &json!({"id": 3})).unwrap(), "3.txt");
    assert!(matches!(
        render_output_path(&renderer, "{{ missing }}", &json!({})),
        Err(Error::TemplateError(_))
    ));
    assert!(matches!(
        render_output_path(&renderer, "{{ p }}", &json!({"p": "a/../../b"})),
        Err(Error::SafetyError(_))
    ));
}

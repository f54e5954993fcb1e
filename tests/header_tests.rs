//! Integration tests over the headers in `test_headers/`.
//!
//! Each test runs the whole pipeline: preprocessing, parsing, assembly and,
//! where asked for, hints.


use cxxdecl::{
    BaseType, CancellationToken, Diagnostic, Dimension, Error, FunctionFlags, ParseOptions, dump,
};
use test_harness::TestHarness;

#[test]
fn widgets_classes_and_members() {
    let harness = TestHarness::new();
    let result = harness.load("widgets.h", &ParseOptions::new());
    result.assert_success();

    let widget = result.class("ui::Widget");
    assert!(widget.is_abstract);
    assert!(widget.has_delete);
    assert_eq!(widget.members.variable("Flags").unwrap().access, cxxdecl::Access::Protected);
    assert_eq!(widget.comment.as_deref(), Some("Base class of every widget."));

    let draw = result.method("ui::Widget", "Draw");
    assert!(draw.has(FunctionFlags::VIRTUAL | FunctionFlags::PURE | FunctionFlags::CONST));
    assert_eq!(draw.comment.as_deref(), Some("Draw the widget."));

    let button = result.class("ui::Button");
    assert_eq!(button.super_classes.len(), 1);
    assert_eq!(button.super_classes[0].as_ref(), "Widget");
    assert!(!button.is_abstract);

    let constructor = button
        .members
        .functions_named("Button")
        .find(|f| !f.has(FunctionFlags::IMPLICIT))
        .unwrap();
    assert!(constructor.has(FunctionFlags::EXPLICIT));
    assert_eq!(constructor.parameters.len(), 2);
    assert_eq!(constructor.parameters[1].value.as_deref(), Some("80"));
    assert!(constructor.return_value.is_none());

    let callback = &result.method("ui::Button", "SetCallback").parameters[0];
    assert_eq!(callback.ty.base(), BaseType::Function);
    assert_eq!(button.members.variable("Width").unwrap().comment.as_deref(), Some("Width in pixels"));
    assert_eq!(button.members.constant("DefaultWidth").unwrap().value.as_deref(), Some("80"));
}

#[test]
fn widgets_special_members_are_synthesized() {
    let harness = TestHarness::new();
    let result = harness.load("widgets.h", &ParseOptions::new());

    let implicit: Vec<&str> = result
        .class("ui::Button")
        .members
        .functions
        .iter()
        .filter(|f| f.has(FunctionFlags::IMPLICIT))
        .map(|f| f.signature.as_str())
        .collect();
    assert_eq!(implicit, ["Button(const Button &)", "~Button()"]);

    let widget_implicit = result
        .class("ui::Widget")
        .members
        .functions
        .iter()
        .filter(|f| f.has(FunctionFlags::IMPLICIT))
        .count();
    assert_eq!(widget_implicit, 1);
}

#[test]
fn widgets_namespace_scope() {
    let harness = TestHarness::new();
    let result = harness.load("widgets.h", &ParseOptions::new());
    let file = result.file();

    assert!(file.description.as_deref().unwrap().contains("Widgets for the demo toolkit."));
    assert_eq!(file.includes, ["common.h", "string"]);
    assert!(file.macros.iter().any(|m| m.name.as_ref() == "WIDGETS_VERSION"));

    let ui = file.contents.namespace("ui").unwrap();
    let layout = ui.members.enumeration("Layout").unwrap();
    assert!(layout.is_scoped);
    let values: Vec<_> = layout.constants.iter().map(|c| c.value.as_deref().unwrap()).collect();
    assert_eq!(values, ["0", "1", "4", "5"]);
    assert!(ui.members.constant("Horizontal").is_none());

    let color = ui.members.class("Color").unwrap();
    assert_eq!(color.members.variables.len(), 3);
    assert!(ui.members.typedef("WidgetPtr").is_some());
    assert!(ui.members.typedef("Handle").is_some());

    assert_eq!(ui.members.constant("MaxWidgets").unwrap().value.as_deref(), Some("64"));
    assert!(ui.members.variable("WidgetCount").is_some());
    assert!(ui.members.function("CreateWidget").unwrap().has(FunctionFlags::NEW_INSTANCE));
    assert!(ui.members.function("InstallExtras").is_none());

    let init = file.contents.members.function("widgets_init").unwrap();
    assert!(init.parameters.is_empty());
}

#[test]
fn followed_includes_define_macros() {
    let harness = TestHarness::new();
    let options = ParseOptions::new().follow_includes(true);
    let result = harness.load("widgets.h", &options);
    let ui = result.file().contents.namespace("ui").unwrap();
    assert!(ui.members.function("InstallExtras").is_some());

    let options = ParseOptions::new().imacros(harness.path("common.h"));
    let result = harness.load("widgets.h", &options);
    let ui = result.file().contents.namespace("ui").unwrap();
    assert!(ui.members.function("InstallExtras").is_some());
}

#[test]
fn shapes_enums_and_fields() {
    let harness = TestHarness::new();
    let result = harness.load("shapes.h", &ParseOptions::new());
    result.assert_success();
    let members = &result.file().contents.members;

    let kind = members.enumeration("ShapeKind").unwrap();
    assert_eq!(kind.comment.as_deref(), Some("Kinds of shape."));
    let values: Vec<_> = kind.constants.iter().map(|c| c.value.as_deref().unwrap()).collect();
    assert_eq!(values, ["0", "1", "10", "11"]);
    assert_eq!(members.constant("SHAPE_LAST").unwrap().value.as_deref(), Some("11"));

    let circle = result.class("Circle");
    assert!(circle.is_final);
    assert!(!circle.is_abstract);
    let segments = circle.members.variable("Segments").unwrap();
    assert_eq!(segments.bit_width.as_deref(), Some("8"));
    let cache = circle.members.variable("Cache").unwrap();
    assert_eq!(cache.dimensions, [Dimension::Literal(4)]);
    assert_eq!(cache.access, cxxdecl::Access::Private);
    assert_eq!(circle.members.variable("Center").unwrap().class_name.as_deref(), Some("Point"));

    // Pasted by DECLARE_AREA(Circle).
    assert!(circle.members.function("CircleArea").unwrap().has(FunctionFlags::CONST));

    let implicit: Vec<&str> = circle
        .members
        .functions
        .iter()
        .filter(|f| f.has(FunctionFlags::IMPLICIT))
        .map(|f| f.signature.as_str())
        .collect();
    assert_eq!(implicit, ["~Circle()"]);
}

#[test]
fn shapes_templates_and_overloads() {
    let harness = TestHarness::new();
    let result = harness.load("shapes.h", &ParseOptions::new());

    let vector = result.class("Vector");
    let template = vector.template.as_ref().unwrap();
    assert_eq!(template.parameters.len(), 2);
    assert_eq!(template.parameters[1].value.as_deref(), Some("3"));
    let get = result.method("Vector", "Get");
    assert_eq!(get.return_value.as_ref().unwrap().ty.base(), BaseType::TypeName);

    let file = result.file();
    assert_eq!(file.contents.members.functions_named("Distance").count(), 1);
    assert_eq!(result.parsed.stats.dropped_overloads, 1);
    assert!(matches!(
        &file.diagnostics[..],
        [Diagnostic::DuplicateOverload { name, .. }] if name.as_ref() == "Distance"
    ));
}

#[test]
fn documentation_comments() {
    let harness = TestHarness::new();
    let result = harness.load("doc_comments.h", &ParseOptions::new());
    let file = result.file();
    let members = &file.contents.members;
    let comment = |name: &str| members.variable(name).unwrap().comment.as_deref();

    assert_eq!(comment("DrawCount"), Some("Counts the widgets drawn so far."));
    assert_eq!(comment("LastWidth"), Some("Width of the last widget"));
    assert_eq!(comment("Unrelated"), None);
    assert_eq!(comment("MinSize"), Some("Shared by both limits."));
    assert_eq!(comment("MaxSize"), Some("Shared by both limits."));

    let palette = members.class("Palette").unwrap();
    assert!(palette.comment.as_deref().unwrap().contains("A named set of colors."));
    let size = file.macros.iter().find(|m| m.name.as_ref() == "PALETTE_SIZE").unwrap();
    assert!(size.comment.as_deref().unwrap().contains("Number of colors in a palette."));

    assert_eq!(
        file.diagnostics,
        [Diagnostic::UnresolvedComment {
            target: "Missing".to_string()
        }]
    );
}

#[test]
fn lenient_mode_skips_broken_declarations() {
    let harness = TestHarness::new();

    let error = harness.try_load("broken.h", &ParseOptions::new()).unwrap_err();
    assert!(matches!(error, Error::Parse(_)));
    assert_eq!(error.span().map(|span| span.line), Some(2));

    let result = harness.load("broken.h", &ParseOptions::new().recover(true));
    assert_eq!(result.parsed.errors.len(), 2);
    let members = &result.file().contents.members;
    assert!(members.variable("Before").is_some());
    assert!(members.variable("After").is_some());
    assert!(members.class("Complete").is_some());
}

#[test]
fn hints_set_return_counts() {
    let harness = TestHarness::new();
    let plain = harness.load("widgets.h", &ParseOptions::new());
    let position = plain.method("ui::Widget", "GetPosition").return_value.as_ref().unwrap();
    assert_eq!(position.count, 0);

    let hints_path = std::env::temp_dir().join(format!("cxxdecl-hints-{}.txt", std::process::id()));
    let text = format!(
        "# class function type size\nWidget GetPosition {:#x} 3\n",
        position.ty.without_specifiers().bits()
    );
    std::fs::write(&hints_path, text).unwrap();
    let hinted = harness.load("widgets.h", &ParseOptions::new().hints(&hints_path));
    std::fs::remove_file(&hints_path).ok();

    let position = hinted.method("ui::Widget", "GetPosition").return_value.as_ref().unwrap();
    assert_eq!(position.count, 3);
    assert_eq!(position.count_hint.as_deref(), Some("3"));
}

#[test]
fn malformed_hints_fail() {
    let harness = TestHarness::new();
    let hints_path = std::env::temp_dir().join(format!("cxxdecl-bad-hints-{}.txt", std::process::id()));
    std::fs::write(&hints_path, "Widget GetPosition\n").unwrap();
    let error = harness
        .try_load("widgets.h", &ParseOptions::new().hints(&hints_path))
        .unwrap_err();
    std::fs::remove_file(&hints_path).ok();
    assert!(matches!(error, Error::Hints(_)));
}

#[test]
fn cancelled_parse_stops() {
    let harness = TestHarness::new();
    let token = CancellationToken::new();
    token.cancel();
    let error = harness
        .try_load("shapes.h", &ParseOptions::new().cancel_token(token))
        .unwrap_err();
    assert!(error.is_cancelled());
}

#[test]
fn dump_is_deterministic() {
    let harness = TestHarness::new();
    let first = dump(harness.load("shapes.h", &ParseOptions::new()).file());
    let second = dump(harness.load("shapes.h", &ParseOptions::new()).file());
    assert_eq!(first, second);

    assert!(first.contains("\n  public class Circle : Shape final\n"));
    assert!(first.contains("\n    SHAPE_SQUARE = 10\n"));
    assert!(first.contains("macro DECLARE_AREA(type) double type##Area() const"));
}

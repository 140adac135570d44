use crate::Colors;

#[test]
fn default_is_off() {
    let colors = Colors::default();
    assert!(!colors.is_enabled());
    assert_eq!(colors.paint(colors.blue, "Header"), "Header");
}

#[test]
fn paint_wraps_and_resets() {
    let colors = Colors::new(true);
    assert!(colors.is_enabled());
    assert_eq!(colors.paint(colors.green, "x"), "\x1b[32mx\x1b[0m");
}

use super::*;

fn ctrl(c: char) -> Keystroke {
    Keystroke::new(KeyCode::Char(c), Modifiers::CTRL)
}

#[test]
fn test_parse_key_string() {
    assert_eq!(parse_key_string("ctrl+r").unwrap(), ctrl('r'));
    assert_eq!(
        parse_key_string("Ctrl+Shift+S").unwrap(),
        Keystroke::new(KeyCode::Char('s'), Modifiers::CTRL | Modifiers::SHIFT)
    );
    assert_eq!(
        parse_key_string("pagedown").unwrap(),
        Keystroke::key(KeyCode::PageDown)
    );
}

#[test]
fn test_parse_key_string_errors() {
    assert!(matches!(
        parse_key_string("ctrl+a+b"),
        Err(KeymapError::InvalidKey(_))
    ));
    assert!(matches!(parse_key_string("ctrl"), Err(KeymapError::InvalidKey(_))));
    assert!(matches!(parse_key_string("hyper"), Err(KeymapError::InvalidKey(_))));
}

#[test]
fn test_embedded_keymap_has_shortcuts() {
    let keymap = embedded_keymap();
    assert_eq!(keymap.lookup(&ctrl('r')), Some(Command::Run));
    assert_eq!(keymap.lookup(&ctrl('s')), Some(Command::Save));
    assert_eq!(keymap.lookup(&ctrl('q')), Some(Command::Quit));
    assert_eq!(
        keymap.lookup(&Keystroke::key(KeyCode::Tab)),
        Some(Command::InsertTab)
    );
    assert_eq!(keymap.lookup(&Keystroke::key(KeyCode::Char('r'))), None);
}

#[cfg(target_os = "macos")]
#[test]
fn test_cmd_shortcuts_on_macos() {
    let keymap = embedded_keymap();
    let stroke = Keystroke::new(KeyCode::Char('r'), Modifiers::META);
    assert_eq!(keymap.lookup(&stroke), Some(Command::Run));
}

#[test]
fn test_user_bindings_override_and_unbind() {
    let user = parse_keymap_yaml(
        r#"
bindings:
  - key: "ctrl+r"
    command: Unbound
  - key: "ctrl+enter"
    command: Run
"#,
    )
    .unwrap();
    let mut bindings = default_bindings();
    bindings.extend(user);
    let keymap = Keymap::with_bindings(bindings);

    assert_eq!(keymap.lookup(&ctrl('r')), None);
    assert_eq!(
        keymap.lookup(&Keystroke::new(KeyCode::Enter, Modifiers::CTRL)),
        Some(Command::Run)
    );
}

#[test]
fn test_unknown_command_is_rejected() {
    let result = parse_keymap_yaml("bindings:\n  - key: \"ctrl+x\"\n    command: Explode\n");
    assert_eq!(
        result,
        Err(KeymapError::InvalidCommand("Explode".to_string()))
    );
}

#[test]
fn test_other_platform_bindings_are_skipped() {
    let other = if cfg!(target_os = "windows") {
        "linux"
    } else {
        "windows"
    };
    let yaml = format!(
        "bindings:\n  - key: \"ctrl+k\"\n    command: Run\n    platform: {}\n",
        other
    );
    assert!(parse_keymap_yaml(&yaml).unwrap().is_empty());
}

#[test]
fn test_command_messages() {
    assert_eq!(Command::Run.to_msgs().len(), 1);
    assert!(Command::Unbound.to_msgs().is_empty());
    assert!(!Command::Save.is_editing());
    assert!(Command::DeleteBackward.is_editing());
}

//! Editor commands attached to key events by shortcut overrides.
//!
//! When the host asks whether a key press should override an application
//! shortcut, text-editing keys are claimed for the page and the matching
//! editor command rides along with the following raw key-down.

use crate::canonical::EventModifiers;
use crate::config::Platform;
use crate::native::{NamedKey, NativeKey};

/// Editing command understood by the engine's editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditCommand {
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    MoveToBeginningOfLine,
    MoveToEndOfLine,
    MoveToBeginningOfLineAndModifySelection,
    MoveToEndOfLineAndModifySelection,
    MoveToBeginningOfDocument,
    MoveToEndOfDocument,
    MoveToBeginningOfDocumentAndModifySelection,
    MoveToEndOfDocumentAndModifySelection,
    MoveWordLeft,
    MoveWordRight,
    MoveWordLeftAndModifySelection,
    MoveWordRightAndModifySelection,
    DeleteWordBackward,
    DeleteWordForward,
    DeleteToBeginningOfLine,
}

impl EditCommand {
    /// The engine's name for the command.
    pub fn name(self) -> &'static str {
        match self {
            EditCommand::Undo => "Undo",
            EditCommand::Redo => "Redo",
            EditCommand::Cut => "Cut",
            EditCommand::Copy => "Copy",
            EditCommand::Paste => "Paste",
            EditCommand::SelectAll => "SelectAll",
            EditCommand::MoveToBeginningOfLine => "MoveToBeginningOfLine",
            EditCommand::MoveToEndOfLine => "MoveToEndOfLine",
            EditCommand::MoveToBeginningOfLineAndModifySelection => {
                "MoveToBeginningOfLineAndModifySelection"
            }
            EditCommand::MoveToEndOfLineAndModifySelection => "MoveToEndOfLineAndModifySelection",
            EditCommand::MoveToBeginningOfDocument => "MoveToBeginningOfDocument",
            EditCommand::MoveToEndOfDocument => "MoveToEndOfDocument",
            EditCommand::MoveToBeginningOfDocumentAndModifySelection => {
                "MoveToBeginningOfDocumentAndModifySelection"
            }
            EditCommand::MoveToEndOfDocumentAndModifySelection => {
                "MoveToEndOfDocumentAndModifySelection"
            }
            EditCommand::MoveWordLeft => "MoveWordLeft",
            EditCommand::MoveWordRight => "MoveWordRight",
            EditCommand::MoveWordLeftAndModifySelection => "MoveWordLeftAndModifySelection",
            EditCommand::MoveWordRightAndModifySelection => "MoveWordRightAndModifySelection",
            EditCommand::DeleteWordBackward => "DeleteWordBackward",
            EditCommand::DeleteWordForward => "DeleteWordForward",
            EditCommand::DeleteToBeginningOfLine => "DeleteToBeginningOfLine",
        }
    }

    /// Clipboard commands the page may claim outside editable fields on macOS.
    pub fn is_clipboard_or_select_all(self) -> bool {
        matches!(
            self,
            EditCommand::Cut | EditCommand::Copy | EditCommand::Paste | EditCommand::SelectAll
        )
    }
}

/// Editor command for a key press, if it is a text-editing shortcut.
///
/// `modifiers` are canonical modifiers, so on macOS Command appears as Meta.
pub fn for_key(platform: Platform, key: NativeKey, modifiers: EventModifiers) -> Option<EditCommand> {
    let primary = match platform {
        Platform::MacOs => EventModifiers::META,
        Platform::Linux | Platform::Windows => EventModifiers::CONTROL,
    };
    let relevant = modifiers
        & (EventModifiers::SHIFT | EventModifiers::CONTROL | EventModifiers::ALT | EventModifiers::META);
    let shift = relevant.contains(EventModifiers::SHIFT);

    if relevant == primary || relevant == primary | EventModifiers::SHIFT {
        if let NativeKey::Character(c) = key {
            let command = match (c.to_ascii_lowercase(), shift) {
                ('z', false) => EditCommand::Undo,
                ('z', true) | ('y', false) => EditCommand::Redo,
                ('a', false) => EditCommand::SelectAll,
                ('c', false) => EditCommand::Copy,
                ('v', false) => EditCommand::Paste,
                ('x', false) => EditCommand::Cut,
                _ => return None,
            };
            return Some(command);
        }
    }

    let NativeKey::Named(named) = key else {
        return None;
    };
    match platform {
        Platform::MacOs => mac_navigation(named, relevant),
        Platform::Linux | Platform::Windows => {
            let control = EventModifiers::CONTROL;
            match (named, relevant) {
                (NamedKey::Backspace, m) if m == control => Some(EditCommand::DeleteWordBackward),
                (NamedKey::Delete, m) if m == control => Some(EditCommand::DeleteWordForward),
                _ => None,
            }
        }
    }
}

fn mac_navigation(key: NamedKey, modifiers: EventModifiers) -> Option<EditCommand> {
    let command = EventModifiers::META;
    let option = EventModifiers::ALT;
    let shift = EventModifiers::SHIFT;
    let with = |base: EditCommand, extend: EditCommand| {
        if modifiers.contains(shift) { extend } else { base }
    };
    let base = modifiers - shift;
    match key {
        NamedKey::ArrowLeft if base == command => Some(with(
            EditCommand::MoveToBeginningOfLine,
            EditCommand::MoveToBeginningOfLineAndModifySelection,
        )),
        NamedKey::ArrowRight if base == command => Some(with(
            EditCommand::MoveToEndOfLine,
            EditCommand::MoveToEndOfLineAndModifySelection,
        )),
        NamedKey::ArrowUp if base == command => Some(with(
            EditCommand::MoveToBeginningOfDocument,
            EditCommand::MoveToBeginningOfDocumentAndModifySelection,
        )),
        NamedKey::ArrowDown if base == command => Some(with(
            EditCommand::MoveToEndOfDocument,
            EditCommand::MoveToEndOfDocumentAndModifySelection,
        )),
        NamedKey::ArrowLeft if base == option => Some(with(
            EditCommand::MoveWordLeft,
            EditCommand::MoveWordLeftAndModifySelection,
        )),
        NamedKey::ArrowRight if base == option => Some(with(
            EditCommand::MoveWordRight,
            EditCommand::MoveWordRightAndModifySelection,
        )),
        NamedKey::Backspace if modifiers == option => Some(EditCommand::DeleteWordBackward),
        NamedKey::Delete if modifiers == option => Some(EditCommand::DeleteWordForward),
        NamedKey::Backspace if modifiers == command => Some(EditCommand::DeleteToBeginningOfLine),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_shortcuts_all_platforms() {
        let cases = [
            (Platform::Linux, EventModifiers::CONTROL),
            (Platform::Windows, EventModifiers::CONTROL),
            (Platform::MacOs, EventModifiers::META),
        ];
        for (platform, primary) in cases {
            assert_eq!(
                for_key(platform, NativeKey::Character('c'), primary),
                Some(EditCommand::Copy)
            );
            assert_eq!(
                for_key(platform, NativeKey::Character('Z'), primary | EventModifiers::SHIFT),
                Some(EditCommand::Redo)
            );
            assert_eq!(
                for_key(platform, NativeKey::Character('a'), primary),
                Some(EditCommand::SelectAll)
            );
        }
    }

    #[test]
    fn test_plain_letters_are_not_commands() {
        assert_eq!(
            for_key(Platform::Linux, NativeKey::Character('c'), EventModifiers::empty()),
            None
        );
        assert_eq!(
            for_key(Platform::Linux, NativeKey::Character('c'), EventModifiers::META),
            None
        );
    }

    #[test]
    fn test_mac_line_navigation() {
        assert_eq!(
            for_key(
                Platform::MacOs,
                NativeKey::Named(NamedKey::ArrowLeft),
                EventModifiers::META
            ),
            Some(EditCommand::MoveToBeginningOfLine)
        );
        assert_eq!(
            for_key(
                Platform::MacOs,
                NativeKey::Named(NamedKey::ArrowRight),
                EventModifiers::META | EventModifiers::SHIFT
            ),
            Some(EditCommand::MoveToEndOfLineAndModifySelection)
        );
        assert_eq!(
            for_key(
                Platform::MacOs,
                NativeKey::Named(NamedKey::Backspace),
                EventModifiers::ALT
            ),
            Some(EditCommand::DeleteWordBackward)
        );
    }

    #[test]
    fn test_control_backspace_elsewhere() {
        assert_eq!(
            for_key(
                Platform::Windows,
                NativeKey::Named(NamedKey::Backspace),
                EventModifiers::CONTROL
            ),
            Some(EditCommand::DeleteWordBackward)
        );
        assert_eq!(
            for_key(
                Platform::Linux,
                NativeKey::Named(NamedKey::ArrowLeft),
                EventModifiers::META
            ),
            None
        );
    }

    #[test]
    fn test_command_names() {
        assert_eq!(EditCommand::SelectAll.name(), "SelectAll");
        assert_eq!(
            EditCommand::MoveToEndOfLineAndModifySelection.name(),
            "MoveToEndOfLineAndModifySelection"
        );
    }
}

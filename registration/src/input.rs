//! Pointer input model shared by the overlay pan/zoom controller and the
//! marker managers.
//!
//! The host converts DOM `PointerEvent`s into [`PointerInput`] values in client
//! (CSS pixel) space. Nothing here touches the DOM.

use crate::geometry::Point;

/// Browser pointer id, stable for the lifetime of one contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub i32);

/// Kind of device behind a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    /// Parse the DOM `pointerType` string. Unknown values count as mouse.
    #[must_use]
    pub fn from_dom(pointer_type: &str) -> Self {
        match pointer_type {
            "touch" => Self::Touch,
            "pen" => Self::Pen,
            _ => Self::Mouse,
        }
    }

    /// Touch and pen contacts hide the target under the finger or stylus.
    #[must_use]
    pub fn is_coarse(self) -> bool {
        matches!(self, Self::Touch | Self::Pen)
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    /// Left mouse button (or a touch/pen contact).
    #[default]
    Primary,
    /// Middle mouse button.
    Middle,
    /// Right mouse button.
    Secondary,
    /// Back, forward, or anything else the device reports.
    Other(i16),
}

impl Button {
    /// Map the DOM `button` field.
    #[must_use]
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => Self::Primary,
            1 => Self::Middle,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

/// One pointer event in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub id: PointerId,
    pub kind: PointerKind,
    pub button: Button,
    pub client: Point,
}

impl PointerInput {
    #[must_use]
    pub fn new(id: i32, kind: PointerKind, button: Button, client: Point) -> Self {
        Self { id: PointerId(id), kind, button, client }
    }

    /// Whether this pointer may start an overlay gesture: any touch or pen
    /// contact, or the primary mouse button.
    #[must_use]
    pub fn starts_gesture(&self) -> bool {
        self.kind != PointerKind::Mouse || self.button == Button::Primary
    }
}

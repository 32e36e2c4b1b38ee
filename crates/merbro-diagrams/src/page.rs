//! Page operations needed by the evaluator.
//!
//! [`DiagramPage`] is the seam between the evaluation logic and the browser:
//! [`Session`](crate::session::Session) implements it over a live Chrome page,
//! tests implement it with canned responses. [`OwnedPage`] adds teardown.

use serde::Deserialize;

use crate::error::Result;

/// Raw `getBoundingClientRect` edges of the mounted SVG.
///
/// Edges may be fractional or negative when the drawing overflows the page origin.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub(crate) struct BoundingRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Capture region of the rendered diagram in whole CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Clip {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Clip {
    /// Snap a bounding rect outward to whole pixels and cut it at the page origin.
    ///
    /// The part left of or above the origin cannot be captured, so it is
    /// removed from the size instead of shifting the box.
    pub fn from_rect(rect: BoundingRect) -> Self {
        let x = rect.left.floor().max(0.0);
        let y = rect.top.floor().max(0.0);
        let right = rect.right.ceil().max(x);
        let bottom = rect.bottom.ceil().max(y);
        Self {
            x: to_px(x),
            y: to_px(y),
            width: to_px(right - x),
            height: to_px(bottom - y),
        }
    }

    /// Right edge (viewport width needed to show the whole box).
    pub fn right(self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (viewport height needed to show the whole box).
    pub fn bottom(self) -> u32 {
        self.y.saturating_add(self.height)
    }
}

/// Convert a non-negative whole pixel value; out-of-range values saturate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_px(value: f64) -> u32 {
    value as u32
}

/// A prepared page with Mermaid loaded.
pub(crate) trait DiagramPage {
    /// Evaluate a script expression, awaiting promises, and return its JSON value.
    ///
    /// `undefined` results come back as `Value::Null`.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Resize the viewport.
    async fn resize_viewport(&self, width: u32, height: u32) -> Result<()>;

    /// Capture a PNG of the given region.
    ///
    /// `beyond_viewport` allows capturing parts outside the current viewport.
    async fn capture_png(&self, clip: Clip, beyond_viewport: bool) -> Result<Vec<u8>>;
}

/// A page that owns its browser and must be torn down after use.
pub(crate) trait OwnedPage: DiagramPage + Sized {
    /// Tear down the page and everything behind it.
    ///
    /// Failures are logged; teardown never replaces the operation's own result.
    async fn release(self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect(left: f64, top: f64, right: f64, bottom: f64) -> BoundingRect {
        BoundingRect {
            left,
            top,
            right,
            bottom,
        }
    }

    #[test]
    fn test_clip_from_rect_snaps_outward() {
        let clip = Clip::from_rect(rect(8.4, 8.0, 308.2, 127.6));
        assert_eq!(
            clip,
            Clip {
                x: 8,
                y: 8,
                width: 301,
                height: 120
            }
        );
    }

    #[test]
    fn test_clip_from_rect_cuts_at_origin() {
        let clip = Clip::from_rect(rect(-12.5, -3.0, 100.2, 50.0));
        assert_eq!(
            clip,
            Clip {
                x: 0,
                y: 0,
                width: 101,
                height: 50
            }
        );
        assert_eq!(clip.right(), 101);
        assert_eq!(clip.bottom(), 50);
    }

    #[test]
    fn test_clip_from_rect_entirely_off_page_is_empty() {
        let clip = Clip::from_rect(rect(-40.0, 10.0, -5.0, 30.0));
        assert_eq!(clip.width, 0);
        assert_eq!(clip.height, 20);
    }

    #[test]
    fn test_clip_edges() {
        let clip = Clip {
            x: 8,
            y: 16,
            width: 100,
            height: 50,
        };
        assert_eq!(clip.right(), 108);
        assert_eq!(clip.bottom(), 66);
    }

    #[test]
    fn test_clip_edges_saturate() {
        let clip = Clip {
            x: u32::MAX,
            y: 1,
            width: 10,
            height: u32::MAX,
        };
        assert_eq!(clip.right(), u32::MAX);
        assert_eq!(clip.bottom(), u32::MAX);
    }
}

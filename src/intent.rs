use crate::controller::NudgeDirection;
use crate::gradient::GradientSpec;
use crate::state::{BorderKind, Color, ShapeKind};

#[derive(Debug, Clone)]
/// Everything the UI can ask the cropping session to do. The shell
/// translates raw events into these and feeds them through one dispatch
/// entry point.
pub enum Intent {
    /// Decoded bitmap handed over after the asynchronous decode completes.
    LoadImage(image::RgbaImage),
    SetShape(ShapeKind),
    SetRotation(i32),
    /// Toolbar zoom steps (×1.2 / ×0.8), intentionally unclamped.
    ZoomIn,
    ZoomOut,
    ZoomTo(f32),
    ZoomToFit,
    /// Wheel/pinch zoom by a factor, clamped to the interactive bounds.
    ZoomBy(f32),
    FlipHorizontal,
    FlipVertical,
    SetBorderKind(BorderKind),
    SetBorderSize(f32),
    SetBorderColor(Color),
    /// Gradient-editor save; switches the border to the custom gradient.
    SaveGradient(GradientSpec),
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    Nudge(NudgeDirection),
    Center,
    Reset,
    CanvasResized { width: f32, height: f32 },
}

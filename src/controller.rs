//! Pointer and keyboard interaction: hit-testing, the move/resize drag
//! state machine, and arrow-key nudging. Mutates the crop area only;
//! rendering reads the result.

use crate::state::{Corner, CropArea, MIN_CROP_SIZE, ShapeKind};

/// Pointer distance (px) from a corner within which a press resizes.
pub const RESIZE_THRESHOLD: f32 = 15.0;

/// Arrow-key nudge step, in canvas pixels.
pub const NUDGE_STEP: f32 = 5.0;

/// Wheel-zoom factors per notch.
pub const WHEEL_ZOOM_IN: f32 = 1.1;
pub const WHEEL_ZOOM_OUT: f32 = 0.9;

/// Relative aspect-ratio drift tolerated before a resize re-squares.
const ASPECT_TOLERANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// What a pointer press at a given position would do.
pub enum Hit {
    Resize(Corner),
    Move,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Moving,
    Resizing,
}

#[derive(Debug)]
/// Transient drag state; lives only between pointer-down and pointer-up.
pub struct Controller {
    gesture: Gesture,
    pointer_origin: (f32, f32),
    area_origin: CropArea,
    /// Corner being dragged; its opposite stays pinned.
    resize_corner: Corner,
    /// Pointer offset from the grabbed corner, so the grab does not snap.
    resize_offset: (f32, f32),
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            gesture: Gesture::Idle,
            pointer_origin: (0.0, 0.0),
            area_origin: CropArea::new(0.0, 0.0, 0.0, 0.0),
            resize_corner: Corner::Se,
            resize_offset: (0.0, 0.0),
        }
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Corner handles win over the interior; the nearest corner within
    /// the threshold is the one grabbed.
    pub fn hit_test(crop: &CropArea, shape: ShapeKind, x: f32, y: f32) -> Hit {
        let mut nearest: Option<(Corner, f32)> = None;
        for corner in Corner::ALL {
            let (cx, cy) = crop.corner_point(corner);
            let distance = (x - cx).hypot(y - cy);
            if distance <= RESIZE_THRESHOLD
                && nearest.is_none_or(|(_, best)| distance < best)
            {
                nearest = Some((corner, distance));
            }
        }
        if let Some((corner, _)) = nearest {
            return Hit::Resize(corner);
        }
        if crop.contains(shape, x, y) {
            return Hit::Move;
        }
        Hit::None
    }

    /// Starts a gesture if the press lands on the crop area or a handle.
    pub fn pointer_down(&mut self, crop: &CropArea, shape: ShapeKind, x: f32, y: f32) {
        match Self::hit_test(crop, shape, x, y) {
            Hit::Resize(corner) => {
                let (cx, cy) = crop.corner_point(corner);
                self.gesture = Gesture::Resizing;
                self.resize_corner = corner;
                self.resize_offset = (x - cx, y - cy);
                self.pointer_origin = (x, y);
                self.area_origin = *crop;
            }
            Hit::Move => {
                self.gesture = Gesture::Moving;
                self.pointer_origin = (x, y);
                self.area_origin = *crop;
            }
            Hit::None => {}
        }
    }

    /// Advances the active gesture; returns true if the crop area changed.
    pub fn pointer_move(
        &mut self,
        crop: &mut CropArea,
        canvas_w: f32,
        canvas_h: f32,
        x: f32,
        y: f32,
    ) -> bool {
        match self.gesture {
            Gesture::Idle => return false,
            Gesture::Moving => {
                crop.x = self.area_origin.x + (x - self.pointer_origin.0);
                crop.y = self.area_origin.y + (y - self.pointer_origin.1);
            }
            Gesture::Resizing => {
                let target = (x - self.resize_offset.0, y - self.resize_offset.1);
                resize_to(crop, self.resize_corner, target);
            }
        }
        crop.constrain(canvas_w, canvas_h);
        true
    }

    /// Ends any gesture, regardless of pointer position.
    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Arrow-key nudge with the usual containment constraint.
    pub fn nudge(crop: &mut CropArea, direction: NudgeDirection, canvas_w: f32, canvas_h: f32) {
        match direction {
            NudgeDirection::Up => crop.y -= NUDGE_STEP,
            NudgeDirection::Down => crop.y += NUDGE_STEP,
            NudgeDirection::Left => crop.x -= NUDGE_STEP,
            NudgeDirection::Right => crop.x += NUDGE_STEP,
        }
        crop.constrain(canvas_w, canvas_h);
    }
}

/// Re-derives the crop rectangle with `corner` dragged to `target` and its
/// opposite corner pinned, preserving the previous aspect ratio and the
/// minimum size.
fn resize_to(crop: &mut CropArea, corner: Corner, target: (f32, f32)) {
    let (tx, ty) = target;
    let right = crop.x + crop.width;
    let bottom = crop.y + crop.height;

    let mut new_x = crop.x;
    let mut new_y = crop.y;
    let mut new_w = crop.width;
    let mut new_h = crop.height;

    match corner {
        Corner::Nw => {
            new_x = tx;
            new_y = ty;
            new_w = right - tx;
            new_h = bottom - ty;
        }
        Corner::Ne => {
            new_y = ty;
            new_w = tx - crop.x;
            new_h = bottom - ty;
        }
        Corner::Sw => {
            new_x = tx;
            new_w = right - tx;
            new_h = ty - crop.y;
        }
        Corner::Se => {
            new_w = tx - crop.x;
            new_h = ty - crop.y;
        }
    }

    // Re-square against the ratio the area had before this event, not a
    // fixed 1:1, so floating drift does not fight the gesture.
    let aspect = crop.width / crop.height;
    if (new_w / new_h - aspect).abs() > ASPECT_TOLERANCE {
        if new_w / new_h > aspect {
            new_w = new_h * aspect;
            if corner.is_west() {
                new_x = right - new_w;
            }
        } else {
            new_h = new_w / aspect;
            if corner.is_north() {
                new_y = bottom - new_h;
            }
        }
    }

    if new_w < MIN_CROP_SIZE {
        new_w = MIN_CROP_SIZE;
        if corner.is_west() {
            new_x = right - new_w;
        }
    }
    if new_h < MIN_CROP_SIZE {
        new_h = MIN_CROP_SIZE;
        if corner.is_north() {
            new_y = bottom - new_h;
        }
    }

    crop.x = new_x;
    crop.y = new_y;
    crop.width = new_w;
    crop.height = new_h;
}

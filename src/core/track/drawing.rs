//=========================================================================
// Track Drawing
//=========================================================================
//
// Stage-side operations on drawing tracks.
//
// Pen changes, resets and stamps are motion commands, so they wait
// behind a glide in flight like any move does. Binding and unbinding
// apply immediately.
//
//=========================================================================

//=== External Dependencies ===============================================

use kurbo::{Point, Vec2};
use log::debug;

//=== Internal Dependencies ===============================================

use super::{Color, Pen, TrackBinding, TrackMark};
use crate::core::entity::{EntityId, TrackId};
use crate::core::motion::MotionCommand;
use crate::core::outcome::NoOp;
use crate::core::stage::Stage;

impl Stage {
    //--- Tracks -----------------------------------------------------------

    pub fn create_track(&mut self) -> TrackId {
        let track = self.tracks.create();
        debug!("Created {:?}", track);
        track
    }

    /// Marks recorded on `track`, oldest first.
    pub fn track_marks(&self, track: TrackId) -> Option<&[TrackMark]> {
        self.tracks.get(track).map(|t| t.marks.as_slice())
    }

    /// Binds `entity` to draw on `track` from `anchor`, a normalized point
    /// on its bounding box.
    ///
    /// A `shared` binding uses the track's pen; otherwise the entity keeps
    /// its own, starting from the default pen.
    pub fn bind_track(
        &mut self,
        entity: EntityId,
        track: TrackId,
        shared: bool,
        anchor: Point,
    ) -> bool {
        let result = self.bind_inner(entity, track, shared, anchor);
        self.conclude("bind_track", result)
    }

    pub fn unbind_track(&mut self, entity: EntityId) -> bool {
        let result = match self.registry.info_mut(entity) {
            Some(info) => info.track.take().map(|_| ()).ok_or(NoOp::UnknownTrack),
            None => Err(NoOp::UnownedHandle),
        };
        self.conclude("unbind_track", result)
    }

    /// The pen `entity` draws with right now.
    pub fn pen(&self, entity: EntityId) -> Option<Pen> {
        let binding = self.registry.info(entity)?.track?;
        Some(self.tracks.pen_for(&binding))
    }

    //--- Pen Commands -----------------------------------------------------

    /// Lowers (`true`) or raises (`false`) the pen.
    pub fn set_drawing(&mut self, entity: EntityId, drawing: bool) -> bool {
        self.submit(entity, MotionCommand::TrackDrawing(drawing))
    }

    pub fn set_pen_width(&mut self, entity: EntityId, width: u8) -> bool {
        self.submit(entity, MotionCommand::PenWidth(width))
    }

    pub fn set_pen_color(&mut self, entity: EntityId, color: Color) -> bool {
        self.submit(entity, MotionCommand::PenColor(color))
    }

    /// Clears every mark on the entity's bound track.
    pub fn reset_track(&mut self, entity: EntityId) -> bool {
        self.submit(entity, MotionCommand::TrackReset)
    }

    /// Imprints the entity at its current position.
    pub fn stamp(&mut self, entity: EntityId) -> bool {
        self.submit(entity, MotionCommand::Stamp)
    }

    //--- Internal Helpers -------------------------------------------------

    fn bind_inner(
        &mut self,
        entity: EntityId,
        track: TrackId,
        shared: bool,
        anchor: Point,
    ) -> Result<(), NoOp> {
        let info = self.registry.info_mut(entity).ok_or(NoOp::UnownedHandle)?;
        if self.tracks.get(track).is_none() {
            return Err(NoOp::UnknownTrack);
        }
        let mut binding = TrackBinding::new(track, shared, anchor);
        binding.pen = self.tracks.pen_for(&binding);
        info.track = Some(binding);
        Ok(())
    }

    /// Records the segment an anchored pen leaves between two positions.
    pub(crate) fn draw_segment(&mut self, entity: EntityId, old: Point, new: Point) {
        let Some(occupant) = self.registry.occupant(entity) else {
            return;
        };
        if occupant.info.transient {
            return;
        }
        let Some(binding) = occupant.info.track else {
            return;
        };
        let pen = self.tracks.pen_for(&binding);
        if !pen.drawing {
            return;
        }

        let bbox = occupant.behavior.bounding_box();
        let anchor = Vec2::new(
            bbox.x0 + binding.anchor.x * bbox.width(),
            bbox.y0 + binding.anchor.y * bbox.height(),
        );
        if let Some(track) = self.tracks.get_mut(binding.track) {
            track.marks.push(TrackMark::Segment {
                from: old + anchor,
                to: new + anchor,
                pen,
            });
        }
    }

    pub(crate) fn edit_pen(
        &mut self,
        entity: EntityId,
        edit: impl FnOnce(&mut Pen),
    ) -> Result<(), NoOp> {
        let info = self.registry.info_mut(entity).ok_or(NoOp::UnownedHandle)?;
        let binding = info.track.as_mut().ok_or(NoOp::UnknownTrack)?;
        self.tracks.edit_pen(binding, edit);
        Ok(())
    }

    pub(crate) fn reset_bound_track(&mut self, entity: EntityId) -> Result<(), NoOp> {
        let info = self.registry.info(entity).ok_or(NoOp::UnownedHandle)?;
        let binding = info.track.ok_or(NoOp::UnknownTrack)?;
        let track = self
            .tracks
            .get_mut(binding.track)
            .ok_or(NoOp::UnknownTrack)?;
        track.marks.clear();
        self.request_repaint();
        Ok(())
    }

    pub(crate) fn stamp_now(&mut self, entity: EntityId) -> Result<(), NoOp> {
        let info = self.registry.info(entity).ok_or(NoOp::UnownedHandle)?;
        let binding = info.track.ok_or(NoOp::UnknownTrack)?;
        let at = info.position;
        let track = self
            .tracks
            .get_mut(binding.track)
            .ok_or(NoOp::UnknownTrack)?;
        track.marks.push(TrackMark::Stamp { entity, at });
        self.request_repaint();
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

use super::{TileRotation, TileRotationTreatment, TileSymmetry};
use crate::rotation::{Rotation, RotationGroup};
use crate::types::{RulesError, Tile};
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};

/// Tiles known to be rotations of one canonical (possibly unnamed) base.
///
/// `entries[r] == t` means "the base rotated by `r` is `t`".
#[derive(Debug, Default)]
struct Subgroup {
    entries: BTreeMap<Rotation, Tile>,
}

/// Incrementally collects rotation facts about tiles and derives the full
/// rotation table from them.
///
/// Every tile belongs to exactly one subgroup. A tile's frame records which
/// subgroup it lives in and which rotation of the subgroup's base it is.
#[derive(Debug)]
pub struct TileRotationBuilder {
    group: RotationGroup,
    default_treatment: TileRotationTreatment,
    treatments: HashMap<Tile, TileRotationTreatment>,
    subgroups: Vec<Subgroup>,
    frames: HashMap<Tile, (usize, Rotation)>,
}

impl TileRotationBuilder {
    pub fn new(group: RotationGroup, default_treatment: TileRotationTreatment) -> Self {
        Self {
            group,
            default_treatment,
            treatments: HashMap::new(),
            subgroups: Vec::new(),
            frames: HashMap::new(),
        }
    }

    pub const fn group(&self) -> &RotationGroup {
        &self.group
    }

    /// Overrides the treatment of missing rotations for one tile.
    pub fn set_treatment(&mut self, tile: Tile, treatment: TileRotationTreatment) {
        self.treatments.insert(tile, treatment);
    }

    /// Records that rotating `source` by `rotation` yields `dest`.
    pub fn add(&mut self, source: Tile, rotation: Rotation, dest: Tile) -> Result<(), RulesError> {
        self.group.check_contains(rotation)?;
        let (source_group, source_frame) = self.frame_of(&source);
        let (dest_group, dest_frame) = self.frame_of(&dest);

        if source_group == dest_group {
            self.set_entry(source_group, source_frame * rotation, dest)?;
        } else {
            // Re-express the destination subgroup relative to the source base.
            let offset = source_frame * rotation * dest_frame.inverse();
            trace!("Merging rotation subgroup {dest_group} into {source_group} with offset {offset}");
            let moved = std::mem::take(&mut self.subgroups[dest_group].entries);
            for (r, tile) in moved {
                self.set_entry(source_group, offset * r, tile)?;
            }
            for frame in self.frames.values_mut() {
                if frame.0 == dest_group {
                    *frame = (source_group, offset * frame.1);
                }
            }
        }
        self.expand(source_group)
    }

    /// Records that `tile` maps to itself under the symmetries of `symmetry`.
    /// Generators outside the configured group are skipped.
    pub fn add_symmetry(&mut self, tile: Tile, symmetry: TileSymmetry) -> Result<(), RulesError> {
        let generators: Vec<Rotation> = if symmetry == TileSymmetry::X {
            self.group.iter().filter(|r| !r.is_identity()).collect()
        } else {
            symmetry.generators()
        };
        for generator in generators {
            if self.group.contains(generator) {
                self.add(tile.clone(), generator, tile.clone())?;
            } else {
                debug!("Skipping {symmetry:?} generator {generator} for {tile}: not in group {}", self.group);
            }
        }
        // Make sure the tile is known even if no generator applied.
        self.frame_of(&tile);
        Ok(())
    }

    /// Finishes the builder, filling missing slots according to each tile's
    /// treatment.
    pub fn build(mut self) -> Result<TileRotation, RulesError> {
        for handle in 0..self.subgroups.len() {
            if self.subgroups[handle].entries.is_empty() {
                continue;
            }
            if self.subgroup_treatment(handle) == TileRotationTreatment::Generated {
                self.generate(handle)?;
            }
        }

        let mut tables = HashMap::with_capacity(self.frames.len());
        for (tile, &(handle, frame)) in &self.frames {
            let entries = &self.subgroups[handle].entries;
            let treatment = self
                .treatments
                .get(tile)
                .copied()
                .unwrap_or(self.default_treatment);
            let mut table = HashMap::with_capacity(self.group.len());
            for r in self.group.iter() {
                match entries.get(&(frame * r)) {
                    Some(found) => {
                        table.insert(r, found.clone());
                    }
                    None if treatment == TileRotationTreatment::Unchanged => {
                        table.insert(r, tile.clone());
                    }
                    None => {}
                }
            }
            tables.insert(tile.clone(), table);
        }

        debug!(
            "Built rotation table for {} tiles over group {}",
            tables.len(),
            self.group
        );
        Ok(TileRotation::from_parts(
            self.group,
            tables,
            self.treatments,
            self.default_treatment,
        ))
    }

    fn frame_of(&mut self, tile: &Tile) -> (usize, Rotation) {
        if let Some(&frame) = self.frames.get(tile) {
            return frame;
        }
        let handle = self.subgroups.len();
        let mut subgroup = Subgroup::default();
        subgroup.entries.insert(Rotation::IDENTITY, tile.clone());
        self.subgroups.push(subgroup);
        let frame = (handle, Rotation::IDENTITY);
        self.frames.insert(tile.clone(), frame);
        frame
    }

    fn base_of(&self, handle: usize) -> Tile {
        let entries = &self.subgroups[handle].entries;
        entries
            .get(&Rotation::IDENTITY)
            .or_else(|| entries.values().next())
            .cloned()
            .unwrap_or(Tile::Value(0))
    }

    fn set_entry(&mut self, handle: usize, rotation: Rotation, tile: Tile) -> Result<(), RulesError> {
        match self.subgroups[handle].entries.get(&rotation) {
            Some(existing) if *existing != tile => Err(RulesError::RotationConflict {
                base: self.base_of(handle),
                rotation,
                existing: existing.clone(),
                conflicting: tile,
            }),
            Some(_) => Ok(()),
            None => {
                self.subgroups[handle].entries.insert(rotation, tile);
                Ok(())
            }
        }
    }

    /// Propagates self-symmetries until no slot can be derived any more.
    ///
    /// If the base rotated by `r1` and by `r2` are the same tile, then the
    /// base rotated by `r1 * r` and `r2 * r` must agree for every `r`.
    fn expand(&mut self, handle: usize) -> Result<(), RulesError> {
        loop {
            let known: Vec<(Rotation, Tile)> = self.subgroups[handle]
                .entries
                .iter()
                .map(|(r, t)| (*r, t.clone()))
                .collect();
            let mut changed = false;
            for (i, (r1, t1)) in known.iter().enumerate() {
                for (r2, t2) in known.iter().skip(i + 1) {
                    if t1 != t2 {
                        continue;
                    }
                    for r in self.group.clone().iter() {
                        let a = *r1 * r;
                        let b = *r2 * r;
                        let entries = &self.subgroups[handle].entries;
                        match (entries.get(&a).cloned(), entries.get(&b).cloned()) {
                            (Some(x), Some(y)) if x != y => {
                                return Err(RulesError::RotationConflict {
                                    base: self.base_of(handle),
                                    rotation: b,
                                    existing: y,
                                    conflicting: x,
                                });
                            }
                            (Some(x), None) => {
                                self.subgroups[handle].entries.insert(b, x);
                                changed = true;
                            }
                            (None, Some(y)) => {
                                self.subgroups[handle].entries.insert(a, y);
                                changed = true;
                            }
                            _ => {}
                        }
                    }
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

    /// Fills the subgroup one slot at a time from the nearest known slot,
    /// re-expanding after each fill so symmetric tiles stay consistent.
    fn generate(&mut self, handle: usize) -> Result<(), RulesError> {
        while self.subgroups[handle].entries.len() < self.group.len() {
            let entries = &self.subgroups[handle].entries;
            let Some(missing) = self.group.iter().find(|r| !entries.contains_key(r)) else {
                break;
            };
            let nearest = entries
                .iter()
                .min_by_key(|(known, _)| {
                    let delta = known.inverse() * missing;
                    (delta.angular_distance(), delta.reflect_x(), **known)
                })
                .map(|(known, tile)| (*known, tile.clone()));
            let Some((known, tile)) = nearest else {
                break;
            };
            let generated = tile.rotated_by(known.inverse() * missing);
            trace!("Generated {generated} for slot {missing} from {tile} at {known}");
            self.set_entry(handle, missing, generated)?;
            self.expand(handle)?;
        }
        Ok(())
    }

    fn subgroup_treatment(&self, handle: usize) -> TileRotationTreatment {
        self.subgroups[handle]
            .entries
            .values()
            .find_map(|tile| self.treatments.get(tile).copied())
            .unwrap_or(self.default_treatment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter() -> Rotation {
        Rotation::new(90, false)
    }

    #[test]
    fn four_cycle_rotates_through_all_tiles() {
        let group = RotationGroup::new(4, false).unwrap();
        let mut builder = TileRotationBuilder::new(group, TileRotationTreatment::Missing);
        let tiles: Vec<Tile> = "abcd".chars().map(Tile::from_char).collect();
        for i in 0..4 {
            builder
                .add(tiles[i].clone(), quarter(), tiles[(i + 1) % 4].clone())
                .unwrap();
        }
        let table = builder.build().unwrap();
        for i in 0..4 {
            for k in 0..4 {
                let r = Rotation::new(90 * k as i32, false);
                assert_eq!(
                    table.rotate(&tiles[i], r),
                    Some(tiles[(i + k) % 4].clone()),
                    "tile {i} by {r}"
                );
            }
        }
    }

    #[test]
    fn conflicting_facts_are_rejected() {
        let group = RotationGroup::new(4, false).unwrap();
        let mut builder = TileRotationBuilder::new(group, TileRotationTreatment::Missing);
        let a = Tile::from_char('a');
        builder.add(a.clone(), quarter(), Tile::from_char('b')).unwrap();
        let err = builder
            .add(a, quarter(), Tile::from_char('c'))
            .unwrap_err();
        assert!(matches!(err, RulesError::RotationConflict { .. }), "{err:?}");
    }

    #[test]
    fn half_turn_symmetry_closes_pairs() {
        let group = RotationGroup::new(4, false).unwrap();
        let mut builder = TileRotationBuilder::new(group, TileRotationTreatment::Missing);
        let horizontal = Tile::from_char('-');
        let vertical = Tile::from_char('|');
        builder.add_symmetry(horizontal.clone(), TileSymmetry::N).unwrap();
        builder
            .add(horizontal.clone(), quarter(), vertical.clone())
            .unwrap();
        let table = builder.build().unwrap();
        assert_eq!(
            table.rotate(&vertical, quarter()),
            Some(horizontal.clone())
        );
        assert_eq!(
            table.rotate(&horizontal, Rotation::new(270, false)),
            Some(vertical)
        );
    }

    #[test]
    fn generated_slots_respect_symmetry() {
        let group = RotationGroup::new(4, false).unwrap();
        let mut builder = TileRotationBuilder::new(group, TileRotationTreatment::Generated);
        let a = Tile::from_char('a');
        builder.add_symmetry(a.clone(), TileSymmetry::N).unwrap();
        let table = builder.build().unwrap();
        let turned = table.rotate(&a, quarter()).unwrap();
        assert_eq!(turned, Tile::Rotated(Box::new(a.clone()), quarter()));
        assert_eq!(table.rotate(&a, Rotation::new(270, false)), Some(turned));
        assert_eq!(table.rotate(&a, Rotation::new(180, false)), Some(a));
    }

    #[test]
    fn symmetry_generators_outside_group_are_skipped() {
        let group = RotationGroup::new(2, false).unwrap();
        let mut builder = TileRotationBuilder::new(group, TileRotationTreatment::Missing);
        let corner = Tile::from_char('L');
        builder.add_symmetry(corner.clone(), TileSymmetry::L).unwrap();
        let table = builder.build().unwrap();
        assert_eq!(table.rotate(&corner, Rotation::new(180, false)), None);
    }
}

//! # Column Iterator
//!
//! The traversal engine: starting from one reference locus it walks the
//! segment graph in every direction (up through top-segment parent links,
//! down through bottom-segment child links, and sideways around paralogy
//! cycles) and materializes the full aligned column for that locus. The
//! per-genome [`PositionCache`](crate::query::cache::PositionCache) makes
//! traversal of cyclic duplication graphs terminate.
//!
//! Strand flips compose along the path: a locus reached through two reversed
//! edges is not reversed relative to the reference. Every edge crossed is
//! verified against its reverse link; a mismatch is structural corruption
//! and aborts the query rather than producing wrong biology.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::data::segment::transform_offset;
use crate::data::{Alignment, Genome, GenomeIdx, SegmentRange, SequenceId};
use crate::error::{RehalError, Result};
use crate::query::cache::PositionCache;
use crate::query::dna::DnaCursor;

/// One aligned column: every touched sequence mapped to its cursors, in
/// discovery order per sequence
pub type ColumnMap = BTreeMap<SequenceId, Vec<DnaCursor>>;

/// A pending traversal step
#[derive(Clone, Copy, Debug)]
struct Locus {
    genome: GenomeIdx,
    position: i64,
    reversed: bool,
}

#[derive(Clone, Copy, Debug)]
enum RefSpan {
    Genome(GenomeIdx),
    Sequence(SequenceId),
}

/// Builder for [`ColumnIterator`] configuration
#[derive(Clone, Debug)]
pub struct ColumnIteratorBuilder {
    span: RefSpan,
    range: Option<(i64, i64)>,
    scope: Option<BTreeSet<GenomeIdx>>,
    max_insertion_length: u64,
    include_paralogs: bool,
}

impl ColumnIteratorBuilder {
    /// Iterate over a genome's whole coordinate space
    pub fn genome(reference: GenomeIdx) -> Self {
        Self::new(RefSpan::Genome(reference))
    }

    /// Iterate over a single sequence
    pub fn sequence(reference: SequenceId) -> Self {
        Self::new(RefSpan::Sequence(reference))
    }

    fn new(span: RefSpan) -> Self {
        Self {
            span,
            range: None,
            scope: None,
            max_insertion_length: u64::MAX,
            include_paralogs: true,
        }
    }

    /// Restrict the traversal range (absolute positions, inclusive)
    pub fn range(mut self, start: i64, end: i64) -> Self {
        self.range = Some((start, end));
        self
    }

    /// Restrict which genomes are visited; the reference is always visited
    pub fn scope(mut self, genomes: impl IntoIterator<Item = GenomeIdx>) -> Self {
        self.scope = Some(genomes.into_iter().collect());
        self
    }

    /// Do not fan out beneath parent-less segments longer than `length`
    pub fn max_insertion_length(mut self, length: u64) -> Self {
        self.max_insertion_length = length;
        self
    }

    /// Include duplicate copies found through paralogy cycles (default true)
    pub fn include_paralogs(mut self, include: bool) -> Self {
        self.include_paralogs = include;
        self
    }

    /// Validate the configuration and compute the first column
    pub fn build(self, alignment: &Alignment) -> Result<ColumnIterator<'_>> {
        let (reference, bounds) = match self.span {
            RefSpan::Genome(g) => {
                if g.as_usize() >= alignment.n_genomes() {
                    return Err(RehalError::invalid_data("reference genome does not exist"));
                }
                let len = alignment.genome(g).sequence_length();
                if len == 0 {
                    return Err(RehalError::invalid_data("reference genome is empty"));
                }
                (g, (0, len as i64 - 1))
            }
            RefSpan::Sequence(id) => {
                if id.genome().as_usize() >= alignment.n_genomes() {
                    return Err(RehalError::invalid_data("reference genome does not exist"));
                }
                let seq = alignment
                    .genome(id.genome())
                    .sequence(id.seq() as usize)
                    .ok_or_else(|| {
                        RehalError::invalid_data("reference sequence does not exist")
                    })?;
                (id.genome(), seq.bounds())
            }
        };
        let (start, end) = self.range.unwrap_or(bounds);
        if start > end || start < bounds.0 || end > bounds.1 {
            return Err(RehalError::invalid_data(format!(
                "range [{start}, {end}] outside reference bounds [{}, {}]",
                bounds.0, bounds.1
            )));
        }
        debug!(
            reference = alignment.genome(reference).name(),
            start,
            end,
            paralogs = self.include_paralogs,
            "building column iterator"
        );
        let mut iter = ColumnIterator {
            alignment,
            reference,
            start,
            end,
            position: start,
            scope: self.scope,
            max_insertion_length: self.max_insertion_length,
            include_paralogs: self.include_paralogs,
            exhausted: false,
            caches: vec![PositionCache::new(); alignment.n_genomes()],
            column: ColumnMap::new(),
        };
        iter.recompute()?;
        Ok(iter)
    }
}

/// Walks the reference range one position at a time, exposing the aligned
/// column at the current position
pub struct ColumnIterator<'a> {
    alignment: &'a Alignment,
    reference: GenomeIdx,
    start: i64,
    end: i64,
    position: i64,
    scope: Option<BTreeSet<GenomeIdx>>,
    max_insertion_length: u64,
    include_paralogs: bool,
    exhausted: bool,
    caches: Vec<PositionCache>,
    column: ColumnMap,
}

impl<'a> ColumnIterator<'a> {
    /// The column at the current reference position. Stable between
    /// advances; empty once the iterator is exhausted.
    pub fn column(&self) -> &ColumnMap {
        &self.column
    }

    /// Current absolute reference position
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Whether the iterator has advanced past its range
    pub fn at_end(&self) -> bool {
        self.exhausted
    }

    /// Advance one reference position rightward. Terminal at the range end:
    /// the first advance past it empties the column, further calls are
    /// no-ops.
    pub fn to_right(&mut self) -> Result<()> {
        if self.exhausted {
            return Ok(());
        }
        if self.position >= self.end {
            self.exhaust();
            return Ok(());
        }
        self.position += 1;
        self.recompute()
    }

    /// Retreat one reference position leftward; terminal at the range start
    pub fn to_left(&mut self) -> Result<()> {
        if self.exhausted {
            return Ok(());
        }
        if self.position <= self.start {
            self.exhaust();
            return Ok(());
        }
        self.position -= 1;
        self.recompute()
    }

    fn exhaust(&mut self) {
        self.exhausted = true;
        self.column.clear();
        for cache in &mut self.caches {
            cache.clear();
        }
    }

    /// Rebuild the column for the current position from scratch
    fn recompute(&mut self) -> Result<()> {
        for cache in &mut self.caches {
            cache.clear();
        }
        self.column.clear();

        let mut stack = vec![Locus {
            genome: self.reference,
            position: self.position,
            reversed: false,
        }];
        let mut is_seed = true;
        let mut visited = 0u64;
        while let Some(locus) = stack.pop() {
            let seed = is_seed;
            is_seed = false;
            if !self.caches[locus.genome.as_usize()].insert(locus.position) {
                continue;
            }
            visited += 1;
            self.visit(locus, seed, &mut stack)?;
        }
        trace!(position = self.position, visited, "column complete");
        Ok(())
    }

    fn visit(&mut self, locus: Locus, is_seed: bool, stack: &mut Vec<Locus>) -> Result<()> {
        let genome = self.alignment.genome(locus.genome);
        let seq = genome
            .sequence_at(locus.position)
            .ok_or_else(|| RehalError::out_of_range(genome.name(), locus.position))?;
        self.column
            .entry(SequenceId::new(locus.genome, seq as u32))
            .or_default()
            .push(DnaCursor::with_strand(
                locus.genome,
                locus.position,
                locus.reversed,
            ));

        let top_hit = genome.top_segment_at(locus.position);

        // A parent-less top segment is a lineage-specific insertion. Beyond
        // the configured bound its subtree is not fanned out further, which
        // keeps long unaligned runs with duplicated descendants from blowing
        // up the traversal. The seed locus is always expanded.
        if !is_seed {
            if let Some((ti, _)) = top_hit {
                let seg = &genome.top_segments()[ti];
                if seg.parent().is_none() && seg.length() > self.max_insertion_length {
                    trace!(
                        genome = genome.name(),
                        position = locus.position,
                        "insertion over bound, pruning fan-out"
                    );
                    return Ok(());
                }
            }
        }

        if let Some((ti, offset)) = top_hit {
            self.extend_up(locus, ti, offset, stack)?;
            if self.include_paralogs {
                self.extend_paralogs(locus, ti, offset, stack)?;
            }
        }
        if let Some((bi, offset)) = genome.bottom_segment_at(locus.position) {
            self.extend_down(locus, bi, offset, stack)?;
        }
        Ok(())
    }

    /// Follow the top segment's parent link, if any
    fn extend_up(
        &self,
        locus: Locus,
        ti: usize,
        offset: u64,
        stack: &mut Vec<Locus>,
    ) -> Result<()> {
        let genome = self.alignment.genome(locus.genome);
        let seg = &genome.top_segments()[ti];
        let Some(pi) = seg.parent() else {
            return Ok(());
        };
        let parent_idx = genome.parent().ok_or_else(|| {
            RehalError::inconsistent_link(format!(
                "top segment {ti} of root genome '{}' has a parent index",
                genome.name()
            ))
        })?;
        if !self.in_scope(parent_idx) {
            return Ok(());
        }
        let parent = self.alignment.genome(parent_idx);
        let pseg = parent.bottom_segments().get(pi as usize).ok_or_else(|| {
            RehalError::inconsistent_link(format!(
                "top segment {ti} of '{}' points past parent '{}' bottom array",
                genome.name(),
                parent.name()
            ))
        })?;
        if pseg.length() != seg.length() {
            return Err(RehalError::inconsistent_link(format!(
                "length mismatch on edge '{}' -> '{}'",
                genome.name(),
                parent.name()
            )));
        }

        // the parent's reverse link must name this segment or one of its
        // paralogs, with a matching strand flag
        let slot = parent.child_slot(locus.genome).ok_or_else(|| {
            RehalError::inconsistent_link(format!(
                "genome '{}' is not a child of '{}'",
                genome.name(),
                parent.name()
            ))
        })?;
        let back = pseg.child_link(slot).ok_or_else(|| {
            RehalError::inconsistent_link(format!(
                "bottom segment {pi} of '{}' has no slot for child '{}'",
                parent.name(),
                genome.name()
            ))
        })?;
        match back.child {
            Some(j) if j as usize == ti => {
                if back.reversed != seg.parent_reversed() {
                    return Err(RehalError::inconsistent_link(format!(
                        "strand flags disagree on edge '{}' -> '{}'",
                        genome.name(),
                        parent.name()
                    )));
                }
            }
            Some(j) => {
                if !paralog_cycle_contains(genome, j as usize, ti)? {
                    return Err(RehalError::inconsistent_link(format!(
                        "bottom segment {pi} of '{}' does not link back to top segment {ti} of '{}'",
                        parent.name(),
                        genome.name()
                    )));
                }
            }
            None => {
                return Err(RehalError::inconsistent_link(format!(
                    "bottom segment {pi} of '{}' deleted on branch to '{}' yet referenced by it",
                    parent.name(),
                    genome.name()
                )));
            }
        }

        let mapped =
            pseg.start() + transform_offset(offset, pseg.length(), seg.parent_reversed()) as i64;
        stack.push(Locus {
            genome: parent_idx,
            position: mapped,
            reversed: locus.reversed ^ seg.parent_reversed(),
        });
        Ok(())
    }

    /// Follow every non-NULL child link of the bottom segment
    fn extend_down(
        &self,
        locus: Locus,
        bi: usize,
        offset: u64,
        stack: &mut Vec<Locus>,
    ) -> Result<()> {
        let genome = self.alignment.genome(locus.genome);
        let seg = &genome.bottom_segments()[bi];
        for (slot, &child_idx) in genome.children().iter().enumerate() {
            let link = seg.child_link(slot).ok_or_else(|| {
                RehalError::inconsistent_link(format!(
                    "bottom segment {bi} of '{}' is missing child slot {slot}",
                    genome.name()
                ))
            })?;
            let Some(ci) = link.child else {
                // deletion on this branch
                continue;
            };
            if !self.in_scope(child_idx) {
                continue;
            }
            let child = self.alignment.genome(child_idx);
            let cseg = child.top_segments().get(ci as usize).ok_or_else(|| {
                RehalError::inconsistent_link(format!(
                    "bottom segment {bi} of '{}' points past child '{}' top array",
                    genome.name(),
                    child.name()
                ))
            })?;
            if cseg.length() != seg.length() {
                return Err(RehalError::inconsistent_link(format!(
                    "length mismatch on edge '{}' -> '{}'",
                    genome.name(),
                    child.name()
                )));
            }
            if cseg.parent() != Some(bi as u32) || cseg.parent_reversed() != link.reversed {
                return Err(RehalError::inconsistent_link(format!(
                    "top segment {ci} of '{}' does not link back to bottom segment {bi} of '{}'",
                    child.name(),
                    genome.name()
                )));
            }
            let mapped =
                cseg.start() + transform_offset(offset, cseg.length(), link.reversed) as i64;
            stack.push(Locus {
                genome: child_idx,
                position: mapped,
                reversed: locus.reversed ^ link.reversed,
            });
        }
        Ok(())
    }

    /// Walk the paralogy cycle, pushing every duplicate at the position
    /// aligned to the same ancestral base. Duplicates are siblings: their own
    /// up/down links are followed when each is popped.
    fn extend_paralogs(
        &self,
        locus: Locus,
        ti: usize,
        offset: u64,
        stack: &mut Vec<Locus>,
    ) -> Result<()> {
        let genome = self.alignment.genome(locus.genome);
        let seg = &genome.top_segments()[ti];
        if seg.next_paralog() as usize == ti {
            return Ok(());
        }
        // offset in the shared ancestral segment's coordinates
        let ancestral = transform_offset(offset, seg.length(), seg.parent_reversed());

        let mut j = seg.next_paralog() as usize;
        let mut steps = 0usize;
        while j != ti {
            steps += 1;
            if steps > genome.top_segments().len() {
                return Err(RehalError::inconsistent_link(format!(
                    "paralog cycle from top segment {ti} of '{}' does not close",
                    genome.name()
                )));
            }
            let dup = genome.top_segments().get(j).ok_or_else(|| {
                RehalError::inconsistent_link(format!(
                    "dangling paralog index {j} in genome '{}'",
                    genome.name()
                ))
            })?;
            if dup.parent() != seg.parent() {
                return Err(RehalError::inconsistent_link(format!(
                    "paralogs {ti} and {j} of '{}' descend from different parents",
                    genome.name()
                )));
            }
            if dup.length() != seg.length() {
                return Err(RehalError::inconsistent_link(format!(
                    "paralogs {ti} and {j} of '{}' differ in length",
                    genome.name()
                )));
            }
            let dup_offset = transform_offset(ancestral, dup.length(), dup.parent_reversed());
            stack.push(Locus {
                genome: locus.genome,
                position: dup.start() + dup_offset as i64,
                reversed: locus.reversed ^ seg.parent_reversed() ^ dup.parent_reversed(),
            });
            j = dup.next_paralog() as usize;
        }
        Ok(())
    }

    fn in_scope(&self, genome: GenomeIdx) -> bool {
        genome == self.reference
            || self
                .scope
                .as_ref()
                .is_none_or(|scope| scope.contains(&genome))
    }
}

/// Whether `target` is reachable in the paralogy cycle starting at `from`
fn paralog_cycle_contains(genome: &Genome, from: usize, target: usize) -> Result<bool> {
    let mut j = from;
    let mut steps = 0usize;
    loop {
        if j == target {
            return Ok(true);
        }
        let seg = genome.top_segments().get(j).ok_or_else(|| {
            RehalError::inconsistent_link(format!(
                "dangling paralog index {j} in genome '{}'",
                genome.name()
            ))
        })?;
        j = seg.next_paralog() as usize;
        if j == from {
            return Ok(false);
        }
        steps += 1;
        if steps > genome.top_segments().len() {
            return Err(RehalError::inconsistent_link(format!(
                "paralog cycle from top segment {from} of '{}' does not close",
                genome.name()
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BottomSegment, TopSegment};

    /// Ancestor with one child, two one-to-one segments of length 4
    fn parent_child() -> Alignment {
        let mut aln = Alignment::new();
        let anc = aln.add_root_genome("anc").unwrap();
        let kid = aln.add_leaf_genome("kid", anc).unwrap();

        let g = aln.genome_mut(anc);
        g.add_sequence("aseq", 8);
        g.set_dna(b"ACGTACGT".to_vec()).unwrap();
        for i in 0..2u32 {
            let mut seg = BottomSegment::new(i as i64 * 4, 4, 1);
            seg.set_child_link(0, Some(i), false);
            g.push_bottom(seg);
        }

        let g = aln.genome_mut(kid);
        g.add_sequence("kseq", 8);
        g.set_dna(b"TTTTGGGG".to_vec()).unwrap();
        for i in 0..2u32 {
            g.push_top(TopSegment::with_parent(i, i as i64 * 4, 4, i, false));
        }
        aln.validate().unwrap();
        aln
    }

    #[test]
    fn test_column_pairs_positions() {
        let aln = parent_child();
        let anc = aln.find_genome("anc").unwrap();
        let kid = aln.find_genome("kid").unwrap();
        let mut iter = ColumnIteratorBuilder::genome(anc).build(&aln).unwrap();
        for pos in 0..8 {
            let column = iter.column();
            assert_eq!(column.len(), 2);
            for cursors in column.values() {
                assert_eq!(cursors.len(), 1);
                assert_eq!(cursors[0].position(), pos);
                assert!(!cursors[0].reversed());
            }
            assert!(column.contains_key(&SequenceId::new(kid, 0)));
            iter.to_right().unwrap();
        }
        assert!(iter.at_end());
        assert!(iter.column().is_empty());
        // further advances are no-ops
        iter.to_right().unwrap();
        assert!(iter.at_end());
    }

    #[test]
    fn test_column_is_idempotent() {
        let aln = parent_child();
        let anc = aln.find_genome("anc").unwrap();
        let iter = ColumnIteratorBuilder::genome(anc).build(&aln).unwrap();
        assert_eq!(iter.column(), iter.column());
        let first = iter.column().clone();
        assert_eq!(&first, iter.column());
    }

    #[test]
    fn test_to_left_walks_back() {
        let aln = parent_child();
        let anc = aln.find_genome("anc").unwrap();
        let mut iter = ColumnIteratorBuilder::genome(anc)
            .range(3, 5)
            .build(&aln)
            .unwrap();
        iter.to_right().unwrap();
        assert_eq!(iter.position(), 4);
        iter.to_left().unwrap();
        assert_eq!(iter.position(), 3);
        iter.to_left().unwrap();
        assert!(iter.at_end());
    }

    #[test]
    fn test_range_validation() {
        let aln = parent_child();
        let anc = aln.find_genome("anc").unwrap();
        assert!(ColumnIteratorBuilder::genome(anc)
            .range(4, 12)
            .build(&aln)
            .is_err());
        assert!(ColumnIteratorBuilder::genome(anc)
            .range(5, 4)
            .build(&aln)
            .is_err());
    }

    #[test]
    fn test_scope_prunes_genomes() {
        let aln = parent_child();
        let anc = aln.find_genome("anc").unwrap();
        let iter = ColumnIteratorBuilder::genome(anc)
            .scope([anc])
            .build(&aln)
            .unwrap();
        assert_eq!(iter.column().len(), 1);
    }

    #[test]
    fn test_inconsistent_strand_flag_detected() {
        let mut aln = parent_child();
        let kid = aln.find_genome("kid").unwrap();
        // flip only the child side of the edge
        aln.genome_mut(kid)
            .top_segment_mut(0)
            .unwrap()
            .set_parent(Some(0), true);
        let anc = aln.find_genome("anc").unwrap();
        let result = ColumnIteratorBuilder::genome(anc).build(&aln);
        assert!(matches!(result, Err(RehalError::InconsistentLink { .. })));
    }

    #[test]
    fn test_sequence_span() {
        let mut aln = Alignment::new();
        let g = aln.add_root_genome("two_seqs").unwrap();
        let genome = aln.genome_mut(g);
        genome.add_sequence("s0", 4);
        genome.add_sequence("s1", 4);
        genome.set_dna(b"AAAACCCC".to_vec()).unwrap();
        let iter = ColumnIteratorBuilder::sequence(SequenceId::new(g, 1))
            .build(&aln)
            .unwrap();
        assert_eq!(iter.position(), 4);
        let entry = iter.column().get(&SequenceId::new(g, 1)).unwrap();
        assert_eq!(entry.len(), 1);
    }
}

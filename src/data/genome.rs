//! # Genomes and the Alignment Tree
//!
//! `Alignment` is an arena of `Genome` values arranged in a rooted tree. A
//! genome references its parent and children by `GenomeIdx` only; the arena
//! owns everything. Each genome carries its named sequences, its DNA bytes,
//! and the two segment arrays that link it to the rest of the tree.
//!
//! The model is populated once (by a builder or a test harness) and is
//! read-only for the lifetime of any query; `validate()` checks the
//! structural invariants the query engine relies on.

use crate::data::segment::{locate, BottomSegment, SegmentRange, TopSegment};
use crate::data::sequence::Sequence;
use crate::data::GenomeIdx;
use crate::error::{RehalError, Result};

/// One species/ancestral node in the alignment tree
#[derive(Clone, Debug)]
pub struct Genome {
    name: String,
    parent: Option<GenomeIdx>,
    children: Vec<GenomeIdx>,
    sequences: Vec<Sequence>,
    dna: Vec<u8>,
    top: Vec<TopSegment>,
    bottom: Vec<BottomSegment>,
}

impl Genome {
    fn new(name: impl Into<String>, parent: Option<GenomeIdx>) -> Self {
        Self {
            name: name.into(),
            parent,
            children: Vec::new(),
            sequences: Vec::new(),
            dna: Vec::new(),
            top: Vec::new(),
            bottom: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<GenomeIdx> {
        self.parent
    }

    pub fn children(&self) -> &[GenomeIdx] {
        &self.children
    }

    /// Slot of `child` in this genome's ordered child list
    pub fn child_slot(&self, child: GenomeIdx) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn sequence(&self, seq: usize) -> Option<&Sequence> {
        self.sequences.get(seq)
    }

    /// Total length of all sequences (the genome's coordinate space)
    pub fn sequence_length(&self) -> u64 {
        self.sequences.iter().map(|s| s.length()).sum()
    }

    /// Ordinal of the sequence containing `position`
    pub fn sequence_at(&self, position: i64) -> Option<usize> {
        let idx = self
            .sequences
            .partition_point(|s| s.bounds().1 < position);
        self.sequences
            .get(idx)
            .filter(|s| s.contains(position))
            .map(|_| idx)
    }

    /// Raw base at an absolute genome position
    pub fn base(&self, position: i64) -> Option<u8> {
        if position < 0 {
            return None;
        }
        self.dna.get(position as usize).copied()
    }

    pub fn top_segments(&self) -> &[TopSegment] {
        &self.top
    }

    pub fn bottom_segments(&self) -> &[BottomSegment] {
        &self.bottom
    }

    /// Containing top segment and forward-strand offset for a position
    pub fn top_segment_at(&self, position: i64) -> Option<(usize, u64)> {
        locate(&self.top, position)
    }

    /// Containing bottom segment and forward-strand offset for a position
    pub fn bottom_segment_at(&self, position: i64) -> Option<(usize, u64)> {
        locate(&self.bottom, position)
    }

    // === Construction (pre-query only) ===

    /// Append a sequence starting where the previous one ended
    pub fn add_sequence(&mut self, name: impl Into<String>, length: u64) -> usize {
        let start = self
            .sequences
            .last()
            .map(|s| s.bounds().1 + 1)
            .unwrap_or(0);
        self.sequences.push(Sequence::new(name, start, length));
        self.sequences.len() - 1
    }

    /// Assign the genome's DNA string; length must match the sequences
    pub fn set_dna(&mut self, dna: impl Into<Vec<u8>>) -> Result<()> {
        let dna = dna.into();
        if dna.len() as u64 != self.sequence_length() {
            return Err(RehalError::invalid_data(format!(
                "DNA length {} does not match sequence length {} in genome '{}'",
                dna.len(),
                self.sequence_length(),
                self.name
            )));
        }
        self.dna = dna;
        Ok(())
    }

    pub fn push_top(&mut self, segment: TopSegment) {
        self.top.push(segment);
    }

    pub fn push_bottom(&mut self, segment: BottomSegment) {
        self.bottom.push(segment);
    }

    pub fn top_segment_mut(&mut self, index: usize) -> Option<&mut TopSegment> {
        self.top.get_mut(index)
    }

    pub fn bottom_segment_mut(&mut self, index: usize) -> Option<&mut BottomSegment> {
        self.bottom.get_mut(index)
    }
}

/// The alignment tree: an arena of genomes plus the root index
#[derive(Clone, Debug, Default)]
pub struct Alignment {
    genomes: Vec<Genome>,
    root: Option<GenomeIdx>,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root genome; fails if a root already exists
    pub fn add_root_genome(&mut self, name: impl Into<String>) -> Result<GenomeIdx> {
        if self.root.is_some() {
            return Err(RehalError::invalid_data("alignment already has a root"));
        }
        let idx = GenomeIdx::new(self.genomes.len() as u32);
        self.genomes.push(Genome::new(name, None));
        self.root = Some(idx);
        Ok(idx)
    }

    /// Create a genome beneath `parent`, appending a child slot to it
    pub fn add_leaf_genome(
        &mut self,
        name: impl Into<String>,
        parent: GenomeIdx,
    ) -> Result<GenomeIdx> {
        if parent.as_usize() >= self.genomes.len() {
            return Err(RehalError::invalid_data("parent genome does not exist"));
        }
        let idx = GenomeIdx::new(self.genomes.len() as u32);
        self.genomes.push(Genome::new(name, Some(parent)));
        self.genomes[parent.as_usize()].children.push(idx);
        Ok(idx)
    }

    pub fn root(&self) -> Option<GenomeIdx> {
        self.root
    }

    pub fn n_genomes(&self) -> usize {
        self.genomes.len()
    }

    pub fn genome(&self, idx: GenomeIdx) -> &Genome {
        &self.genomes[idx.as_usize()]
    }

    pub fn genome_mut(&mut self, idx: GenomeIdx) -> &mut Genome {
        &mut self.genomes[idx.as_usize()]
    }

    pub fn find_genome(&self, name: &str) -> Option<GenomeIdx> {
        self.genomes
            .iter()
            .position(|g| g.name() == name)
            .map(|i| GenomeIdx::new(i as u32))
    }

    pub fn genomes(&self) -> impl Iterator<Item = (GenomeIdx, &Genome)> {
        self.genomes
            .iter()
            .enumerate()
            .map(|(i, g)| (GenomeIdx::new(i as u32), g))
    }

    /// Check the structural invariants queries rely on: segment arrays tile
    /// their genome in order, bottom segments carry one slot per child, and
    /// every cross-genome link is mirrored on the other side.
    pub fn validate(&self) -> Result<()> {
        for genome in &self.genomes {
            self.validate_tiling(genome, genome.top_segments())?;
            self.validate_tiling(genome, genome.bottom_segments())?;
            for (bi, seg) in genome.bottom_segments().iter().enumerate() {
                if seg.n_children() != genome.children().len() {
                    return Err(RehalError::invalid_data(format!(
                        "bottom segment {} of genome '{}' has {} child slots, expected {}",
                        bi,
                        genome.name(),
                        seg.n_children(),
                        genome.children().len()
                    )));
                }
                for (slot, link) in seg.child_links().iter().enumerate() {
                    let Some(ci) = link.child else { continue };
                    let child = self.genome(genome.children()[slot]);
                    let back = child.top_segments().get(ci as usize).ok_or_else(|| {
                        RehalError::inconsistent_link(format!(
                            "bottom segment {} of '{}' points past child '{}' top array",
                            bi,
                            genome.name(),
                            child.name()
                        ))
                    })?;
                    if back.length() != seg.length() {
                        return Err(RehalError::inconsistent_link(format!(
                            "segment length mismatch between '{}' and child '{}'",
                            genome.name(),
                            child.name()
                        )));
                    }
                }
            }
            for (ti, seg) in genome.top_segments().iter().enumerate() {
                if seg.next_paralog() as usize >= genome.top_segments().len() {
                    return Err(RehalError::inconsistent_link(format!(
                        "top segment {} of '{}' has dangling paralog index",
                        ti,
                        genome.name()
                    )));
                }
                let Some(pi) = seg.parent() else { continue };
                let parent_idx = genome.parent().ok_or_else(|| {
                    RehalError::inconsistent_link(format!(
                        "top segment {} of root genome '{}' has a parent index",
                        ti,
                        genome.name()
                    ))
                })?;
                let parent = self.genome(parent_idx);
                let pseg = parent.bottom_segments().get(pi as usize).ok_or_else(|| {
                    RehalError::inconsistent_link(format!(
                        "top segment {} of '{}' points past parent bottom array",
                        ti,
                        genome.name()
                    ))
                })?;
                if pseg.length() != seg.length() {
                    return Err(RehalError::inconsistent_link(format!(
                        "segment length mismatch between '{}' and parent '{}'",
                        genome.name(),
                        parent.name()
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_tiling<S: SegmentRange>(&self, genome: &Genome, segments: &[S]) -> Result<()> {
        if segments.is_empty() {
            return Ok(());
        }
        let mut expected = 0i64;
        for (i, seg) in segments.iter().enumerate() {
            if seg.length() == 0 {
                return Err(RehalError::invalid_data(format!(
                    "zero-length segment {} in genome '{}'",
                    i,
                    genome.name()
                )));
            }
            if seg.start() != expected {
                return Err(RehalError::invalid_data(format!(
                    "segment {} of genome '{}' starts at {}, expected {}",
                    i,
                    genome.name(),
                    seg.start(),
                    expected
                )));
            }
            expected = seg.last_position() + 1;
        }
        if expected as u64 != genome.sequence_length() {
            return Err(RehalError::invalid_data(format!(
                "segments of genome '{}' cover {} bases, expected {}",
                genome.name(),
                expected,
                genome.sequence_length()
            )));
        }
        Ok(())
    }
}

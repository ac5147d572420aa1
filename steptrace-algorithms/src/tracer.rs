//! Secondary-particle tree reconstruction.
//!
//! Descendants are found by matching `parent_id` against the primary's track
//! number, recursing into every accepted child. The optional position gate
//! only applies to the primary's direct children.

use std::collections::HashSet;

use steptrace_core::{ParticleRecord, TrackNumber};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default recursion limit of the tracer.
pub const DEFAULT_MAX_DEPTH: usize = 1_000;

/// Configuration for secondary tracing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceConfig {
    /// Keep only direct children created at the primary's final step point.
    pub use_position: bool,
    /// Maximum recursion depth below the direct children.
    pub max_depth: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            use_position: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TraceConfig {
    /// Creates a new trace configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the position gate.
    #[must_use]
    pub fn with_use_position(mut self, use_position: bool) -> Self {
        self.use_position = use_position;
        self
    }

    /// Sets the recursion limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Collects all descendants of a primary record within one event.
#[derive(Debug, Clone, Default)]
pub struct SecondaryTracer {
    config: TraceConfig,
}

impl SecondaryTracer {
    /// Creates a tracer with the given configuration.
    #[must_use]
    pub fn new(config: TraceConfig) -> Self {
        Self { config }
    }

    /// Get current configuration.
    #[must_use]
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Returns the descendants of `primary` in `event`.
    ///
    /// The searched parent number is `parent_override` if given, else the
    /// primary's own scalar track id. A merged (segment list) id is not
    /// resolved here: without an override it matches no child.
    ///
    /// Direct children come first in file order, followed by the descendants
    /// of each child in turn (depth first).
    #[must_use]
    pub fn trace<'e>(
        &self,
        primary: &ParticleRecord,
        event: &'e [ParticleRecord],
        parent_override: Option<TrackNumber>,
    ) -> Vec<&'e ParticleRecord> {
        let search = parent_override.or_else(|| primary.track_id.as_single());
        let mut expanded: HashSet<TrackNumber> = search.into_iter().collect();
        let mut secondaries = Vec::new();
        self.collect(
            primary,
            event,
            search,
            self.config.use_position,
            0,
            &mut expanded,
            &mut secondaries,
        );
        secondaries
    }

    #[allow(clippy::too_many_arguments)]
    fn collect<'e>(
        &self,
        primary: &ParticleRecord,
        event: &'e [ParticleRecord],
        search: Option<TrackNumber>,
        use_position: bool,
        depth: usize,
        expanded: &mut HashSet<TrackNumber>,
        secondaries: &mut Vec<&'e ParticleRecord>,
    ) {
        let Some(parent_id) = search else {
            return;
        };

        let children = direct_children(primary, event, parent_id, use_position);
        if children.is_empty() {
            return;
        }
        secondaries.extend(children.iter().copied());

        if depth >= self.config.max_depth {
            log::warn!(
                "secondary trace of track {} stopped at depth {}",
                primary.track_id,
                depth
            );
            return;
        }

        for child in children {
            let Some(child_id) = child.track_id.as_single() else {
                continue;
            };
            // A repeated track number means cyclic parent links.
            if !expanded.insert(child_id) {
                continue;
            }
            self.collect(
                child,
                event,
                Some(child_id),
                false,
                depth + 1,
                expanded,
                secondaries,
            );
        }
    }
}

fn direct_children<'e>(
    primary: &ParticleRecord,
    event: &'e [ParticleRecord],
    parent_id: TrackNumber,
    use_position: bool,
) -> Vec<&'e ParticleRecord> {
    let end_point = primary.last_position();
    event
        .iter()
        .filter(|candidate| candidate.parent_id == parent_id)
        .filter(|candidate| {
            !use_position
                || match (candidate.first_position(), end_point) {
                    (Ok(start), Ok(end)) => start.coincides_with(&end),
                    _ => false,
                }
        })
        .collect()
}

/// Returns all descendants of `primary` with the default depth limit.
///
/// See [`SecondaryTracer::trace`].
#[must_use]
pub fn trace_secondaries<'e>(
    primary: &ParticleRecord,
    event: &'e [ParticleRecord],
    parent_override: Option<TrackNumber>,
    use_position: bool,
) -> Vec<&'e ParticleRecord> {
    SecondaryTracer::new(TraceConfig::new().with_use_position(use_position)).trace(
        primary,
        event,
        parent_override,
    )
}

/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    ops::Neg,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use arrayvec::ArrayVec;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::{
    capture_value, evaluate, generate_captures, generate_check_evasions, generate_legal,
    is_legal, moves_to_san, tune, BookProbe, Bound, CheckCache, HistoryTable, KillerTable, Move,
    MovePicker, Piece, Position, Score, SearchInterrupted, Square, TTable, TTableEntry,
    TablebaseProbe, ZobristKey, MAX_NUM_MOVES,
};

/// Maximum depth that can be searched
pub const MAX_DEPTH: u8 = u8::MAX / 2;

/// A marker trait for the types of nodes encountered during search.
trait NodeType {
    /// Is this node the first searched?
    const ROOT: bool;

    /// Is this node a PV node?
    const PV: bool;
}

/// First node searched.
struct RootNode;
impl NodeType for RootNode {
    const ROOT: bool = true;
    const PV: bool = true;
}

/// A node on the principal variation, searched with a non-null window.
struct PvNode;
impl NodeType for PvNode {
    const ROOT: bool = false;
    const PV: bool = true;
}

/// A node not on the principal variation, searched with a null window.
struct NonPvNode;
impl NodeType for NonPvNode {
    const ROOT: bool = false;
    const PV: bool = false;
}

/// Represents the best sequence of moves found during a search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalVariation(ArrayVec<Move, { MAX_DEPTH as usize }>);

impl PrincipalVariation {
    /// An empty PV.
    pub const EMPTY: Self = Self(ArrayVec::new_const());

    /// clears the moves of `self`.
    #[inline(always)]
    fn clear(&mut self) {
        self.0.clear();
    }

    /// Replace the contents of `self` with `mv` followed by the contents of `other`.
    ///
    /// Moves past [`MAX_DEPTH`] are dropped.
    #[inline(always)]
    fn extend(&mut self, mv: Move, other: &Self) {
        self.clear();
        self.0.push(mv);
        let room = self.0.remaining_capacity();
        self.0.extend(other.0.iter().copied().take(room));
    }

    /// The moves of this PV, from the root onwards.
    #[inline(always)]
    pub fn moves(&self) -> &[Move] {
        &self.0
    }

    /// The first move of this PV, if any.
    #[inline(always)]
    pub fn first(&self) -> Option<Move> {
        self.0.first().copied()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PrincipalVariation {
    #[inline(always)]
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Bounds within an alpha-beta search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    /// Lower bound.
    ///
    /// We are guaranteed a score that is AT LEAST `alpha`.
    /// During search, if no move can raise `alpha`, we are said to have "failed low."
    pub alpha: Score,

    /// Upper bound.
    ///
    /// Our opponent is guaranteed a score that is AT MOST `beta`.
    /// During search, if a move scores higher than `beta`, we are said to have "failed high."
    pub beta: Score,
}

impl SearchBounds {
    /// Create a new [`SearchBounds`] from the provided `alpha` and `beta` values.
    #[inline(always)]
    pub const fn new(alpha: Score, beta: Score) -> Self {
        Self { alpha, beta }
    }

    /// Create a "null window" around `alpha`.
    #[inline(always)]
    fn null_alpha(self) -> Self {
        Self::new(self.alpha, self.alpha + 1)
    }

    /// Midpoint of the window.
    #[inline(always)]
    fn midpoint(self) -> Score {
        (self.alpha + self.beta) / 2
    }
}

impl Neg for SearchBounds {
    type Output = Self;
    /// Negating a [`SearchBounds`] swaps the `alpha` and `beta` fields and negates them both.
    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self {
            alpha: -self.beta,
            beta: -self.alpha,
        }
    }
}

impl Default for SearchBounds {
    /// Default [`SearchBounds`] are a `(-infinity, infinity)`.
    #[inline(always)]
    fn default() -> Self {
        Self::new(Score::ALPHA, Score::BETA)
    }
}

/// Where the move of a [`SearchResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultSource {
    /// Alpha-beta search.
    #[default]
    Search,

    /// The opening book; no search was run.
    Book,
}

/// The result of a search, containing the best move found, score, and total nodes searched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchResult {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found during the search.
    pub bestmove: Option<Move>,

    /// Evaluation of the position, from the side-to-move's perspective.
    pub score: Score,

    /// The deepest fully-completed depth that produced this result.
    pub depth: u8,

    /// Principal variation of the deepest completed depth.
    pub pv: PrincipalVariation,

    /// Why the search stopped early, if it did.
    pub interrupted: Option<SearchInterrupted>,

    pub source: ResultSource,
}

impl Default for SearchResult {
    /// A default search result should initialize to a *very bad* value,
    /// since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: Score::ALPHA,
            depth: 0,
            pv: PrincipalVariation::EMPTY,
            interrupted: None,
            source: ResultSource::Search,
        }
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum depth to execute the search.
    pub max_depth: u8,

    /// Node allowance.
    ///
    /// If the search exceeds this many nodes, it will exit as quickly as possible.
    pub max_nodes: u64,

    /// Start time of the search.
    ///
    /// Reset by [`Search::start`], so a config may be built well before it is used.
    pub starttime: Instant,

    /// Soft limit on search time.
    ///
    /// During iterative deepening, if a depth concludes and this timeout is exceeded,
    /// no deeper iteration is started.
    pub soft_timeout: Duration,

    /// Hard limit on search time.
    ///
    /// During *any* point in the search, if this limit is exceeded, the search will cancel.
    pub hard_timeout: Duration,

    /// Probe and store the transposition table.
    pub use_ttable: bool,

    /// Probe the opening book at the root, if one is attached.
    pub use_book: bool,

    /// Extend the search by one ply instead of entering quiescence while in check.
    pub check_extension: bool,

    /// Probability, in `[0, 1]`, of returning the window midpoint from a quiescence node without searching it.
    ///
    /// This deliberately weakens play. `0.0` disables it.
    pub quiescence_skip_chance: f64,

    /// Seed of the random number generator behind `quiescence_skip_chance`.
    pub seed: u64,

    /// Number of nodes between checks of the clock and the stop flag.
    pub timecheck_interval: u64,
}

impl SearchConfig {
    /// Constructs a [`SearchConfig`] that manages a clock of `time` remaining with `inc` added per move.
    pub fn from_clock(time: Duration, inc: Duration) -> Self {
        let inc = inc / tune::time_inc_divisor!();

        Self {
            soft_timeout: time / tune::soft_timeout_divisor!() + inc,
            hard_timeout: time / tune::hard_timeout_divisor!() + inc,
            ..Default::default()
        }
    }

    /// Constructs a [`SearchConfig`] limited only by depth.
    pub fn with_depth(depth: u8) -> Self {
        Self {
            max_depth: depth.min(MAX_DEPTH),
            ..Default::default()
        }
    }
}

impl Default for SearchConfig {
    /// A default [`SearchConfig`] will permit an "infinite" search.
    ///
    /// The word "infinite" is quoted here because the actual defaults are the `::MAX` values for each field.
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_nodes: u64::MAX,
            starttime: Instant::now(),
            soft_timeout: Duration::MAX,
            hard_timeout: Duration::MAX,
            use_ttable: true,
            use_book: true,
            check_extension: true,
            quiescence_skip_chance: 0.0,
            seed: 0,
            timecheck_interval: tune::timecheck_interval!(),
        }
    }
}

/// Mutable state of one search, threaded through every recursive call.
#[derive(Debug)]
pub struct SearchContext {
    /// Number of nodes searched.
    pub nodes: u64,

    /// If this is ever `false`, the search must exit as soon as possible.
    is_searching: Arc<AtomicBool>,

    /// Configuration variables for this instance of the search.
    config: SearchConfig,

    /// Nodes left until the clock and flag are polled again.
    timecheck_counter: u64,

    /// Set once the search has been cut short.
    pub interrupted: Option<SearchInterrupted>,

    /// Drives `quiescence_skip_chance`.
    rng: StdRng,

    /// Quiet moves that caused a beta cutoff, per remaining depth.
    pub killers: KillerTable,

    /// Bonuses for quiet moves that caused beta cutoffs.
    pub history: HistoryTable,

    /// Memo of in-check queries.
    pub check_cache: CheckCache,
}

impl SearchContext {
    pub fn new(config: SearchConfig, is_searching: Arc<AtomicBool>) -> Self {
        Self {
            nodes: 0,
            is_searching,
            timecheck_counter: config.timecheck_interval.max(1),
            interrupted: None,
            rng: StdRng::seed_from_u64(config.seed),
            killers: KillerTable::default(),
            history: HistoryTable::default(),
            check_cache: CheckCache::default(),
            config,
        }
    }

    /// Counts a node and returns `true` if the search must stop.
    ///
    /// The node limit is exact. The clock and the stop flag are only polled every `timecheck_interval` nodes.
    #[inline(always)]
    fn visit(&mut self) -> bool {
        self.nodes += 1;

        if self.interrupted.is_some() {
            return true;
        }

        if self.nodes >= self.config.max_nodes {
            self.interrupted = Some(SearchInterrupted::NodeLimit);
            return true;
        }

        self.timecheck_counter -= 1;
        if self.timecheck_counter == 0 {
            self.timecheck_counter = self.config.timecheck_interval.max(1);
            self.poll();
        }

        self.interrupted.is_some()
    }

    /// Checks the stop flag and the hard timeout right now.
    #[inline(always)]
    fn poll(&mut self) {
        if !self.is_searching.load(Ordering::Relaxed) {
            self.interrupted = Some(SearchInterrupted::Stopped);
        } else if self.config.starttime.elapsed() >= self.config.hard_timeout {
            self.interrupted = Some(SearchInterrupted::Timeout);
        }
    }

    /// Returns `true` if quiescence should bail out at random.
    #[inline(always)]
    fn skip_quiescence(&mut self) -> bool {
        let chance = self.config.quiescence_skip_chance;
        chance > 0.0 && self.rng.gen_bool(chance.min(1.0))
    }
}

/// Executes a search on a position.
pub struct Search<'a> {
    /// Mutable per-search state.
    ctx: SearchContext,

    /// Transposition table used to cache information during search.
    ttable: &'a mut TTable,

    book: Option<&'a dyn BookProbe>,

    tablebase: Option<&'a dyn TablebaseProbe>,
}

impl<'a> Search<'a> {
    /// Construct a new [`Search`] instance to execute.
    #[inline(always)]
    pub fn new(is_searching: Arc<AtomicBool>, config: SearchConfig, ttable: &'a mut TTable) -> Self {
        Self {
            ctx: SearchContext::new(config, is_searching),
            ttable,
            book: None,
            tablebase: None,
        }
    }

    /// Attach an opening book, probed once at the root.
    pub fn with_book(mut self, book: &'a dyn BookProbe) -> Self {
        self.book = Some(book);
        self
    }

    /// Attach an endgame tablebase, probed at every node of the main search.
    pub fn with_tablebase(mut self, tablebase: &'a dyn TablebaseProbe) -> Self {
        self.tablebase = Some(tablebase);
        self
    }

    /// The per-search state, for inspection once a search is over.
    pub fn context(&self) -> &SearchContext {
        &self.ctx
    }

    /// Start the search on the supplied [`Position`], returning a [`SearchResult`].
    ///
    /// The position is mutated in place while searching, and is restored before this returns.
    pub fn start(&mut self, position: &mut Position) -> SearchResult {
        self.ctx.config.starttime = Instant::now();
        let config = self.ctx.config;
        info!(
            fen = %position.to_fen(),
            max_depth = config.max_depth,
            max_nodes = config.max_nodes,
            soft_timeout_ms = config.soft_timeout.as_millis() as u64,
            hard_timeout_ms = config.hard_timeout.as_millis() as u64,
            "starting search"
        );

        if let Some(result) = self.probe_book(position) {
            return result;
        }

        if config.use_ttable {
            self.ttable.new_search();
        }

        let result = self.iterative_deepening(position);

        debug!(
            hits = self.ttable.hits(),
            accesses = self.ttable.accesses(),
            collisions = self.ttable.collisions(),
            check_cache_hits = self.ctx.check_cache.hits(),
            "TT stats"
        );

        result
    }

    /// Returns the book move for the root, if the book is enabled and has a legal one.
    fn probe_book(&mut self, position: &mut Position) -> Option<SearchResult> {
        if !self.ctx.config.use_book {
            return None;
        }

        let entry = self.book?.probe(position)?;
        debug!(mv = %entry.mv, weight = entry.weight, games = entry.games, "book hit");

        let mut pv = PrincipalVariation::default();
        pv.extend(entry.mv, &PrincipalVariation::EMPTY);

        Some(SearchResult {
            bestmove: Some(entry.mv),
            score: Score::DRAW,
            pv,
            source: ResultSource::Book,
            ..Default::default()
        })
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening) (ID) on the position.
    ///
    /// After each iteration, we check if we've exceeded our `soft_timeout` and, if we haven't, we run a search at a greater depth.
    /// An iteration that is interrupted is thrown away, and the last completed one is returned.
    fn iterative_deepening(&mut self, position: &mut Position) -> SearchResult {
        let config = self.ctx.config;
        let root_moves = generate_legal(position);

        // Fall back to the first legal move, in case not even depth 1 completes
        let mut result = SearchResult {
            bestmove: root_moves.first().copied(),
            score: evaluate(position),
            ..Default::default()
        };

        // Nothing to search; the game is already over
        if root_moves.is_empty() {
            result.score = if position.in_check() {
                Score::mated_in(0)
            } else {
                Score::DRAW
            };
            return result;
        }

        let mut depth = 1;
        while depth <= config.max_depth {
            // A deeper iteration probably wouldn't finish in time
            if depth > 1 && config.starttime.elapsed() >= config.soft_timeout {
                break;
            }

            let mut pv = PrincipalVariation::default();
            let score =
                self.negamax::<RootNode>(position, depth, 0, SearchBounds::default(), &mut pv);

            if let Some(reason) = self.ctx.interrupted {
                warn!(
                    depth,
                    %reason,
                    completed = result.depth,
                    "search interrupted; keeping the last completed depth"
                );
                result.interrupted = Some(reason);
                break;
            }

            result.score = score;
            result.depth = depth;
            result.bestmove = pv.first().or(result.bestmove);
            result.pv = pv;

            let elapsed = config.starttime.elapsed();
            info!(
                depth,
                score = %score,
                nodes = self.ctx.nodes,
                nps = (self.ctx.nodes as f64 / elapsed.as_secs_f64().max(1e-9)) as u64,
                time_ms = elapsed.as_millis() as u64,
                pv = %moves_to_san(position, result.pv.moves()).join(" "),
                "completed depth"
            );

            // A mate shorter than the current depth can't be improved upon
            if score.is_mate() && score.plies_to_mate() <= depth as i32 {
                break;
            }

            depth += 1;
        }

        result.nodes = self.ctx.nodes;
        result
    }

    /// Primary location of search logic.
    ///
    /// Uses the [negamax](https://www.chessprogramming.org/Negamax) algorithm in a [fail soft](https://www.chessprogramming.org/Alpha-Beta#Negamax_Framework) framework.
    fn negamax<Node: NodeType>(
        &mut self,
        position: &mut Position,
        mut depth: u8,
        ply: i32,
        mut bounds: SearchBounds,
        pv: &mut PrincipalVariation,
    ) -> Score {
        // Clear any nodes in this PV, since we're searching from a new position
        pv.clear();

        if self.ctx.visit() {
            return evaluate(position);
        }

        if !Node::ROOT {
            /****************************************************************************************************
             * Mate Distance Pruning: https://www.chessprogramming.org/Mate_Distance_Pruning
             *
             * Even mating on the very next move cannot beat a shorter mate found elsewhere in the tree.
             ****************************************************************************************************/
            bounds.alpha = bounds.alpha.max(Score::mated_in(ply));
            bounds.beta = bounds.beta.min(Score::mate_in(ply + 1));
            if bounds.alpha >= bounds.beta {
                return bounds.alpha;
            }
        }

        // Perfect information trumps everything else
        if let Some(hit) = self.tablebase.and_then(|tb| tb.probe(position)) {
            debug!(mv = %hit.mv, outcome = ?hit.outcome, plies = hit.plies, "tablebase hit");
            if is_legal(position, hit.mv) {
                pv.extend(hit.mv, &PrincipalVariation::EMPTY);
            }
            return hit.score(ply);
        }

        // Repetitions depend on history, not just the position, so they are tested before the TT
        if !Node::ROOT && self.is_draw(position) {
            return Score::DRAW;
        }

        if ply >= MAX_DEPTH as i32 {
            return evaluate(position);
        }

        /****************************************************************************************************
         * TT Cutoffs: https://www.chessprogramming.org/Transposition_Table#Transposition_Table_Cutoffs
         ****************************************************************************************************/
        let key = position.key();
        let mut tt_move = None;
        if self.ctx.config.use_ttable {
            if let Some(entry) = self.ttable.probe(&key) {
                tt_move = entry.bestmove;

                // Do not prune in PV nodes
                if !Node::PV && entry.depth >= depth {
                    if let Some(score) = self.narrow_with_tt(&entry, ply, &mut bounds) {
                        return score;
                    }
                }
            }
        }

        let in_check = self
            .ctx
            .check_cache
            .is_in_check(position, position.side_to_move());

        /****************************************************************************************************
         * Quiescence Search: https://www.chessprogramming.org/Quiescence_Search
         *
         * Checks are never evaluated quietly; they get one more ply of full search instead.
         ****************************************************************************************************/
        if depth == 0 {
            if in_check && self.ctx.config.check_extension {
                depth = 1;
            } else {
                return self.quiescence(position, ply, bounds);
            }
        }

        let moves = if in_check {
            generate_check_evasions(position)
        } else {
            generate_legal(position)
        };

        // If there are no legal moves, it's either mate or a draw.
        if moves.is_empty() {
            return if in_check {
                // Offset by ply to prefer earlier mates
                Score::mated_in(ply)
            } else {
                Score::DRAW
            };
        }

        // Sort moves so that we look at "promising" ones first
        let picker = {
            let position: &Position = position;
            let search: &Self = self;
            MovePicker::new(moves, |mv| search.score_move(position, *mv, tt_move, depth))
        };

        let mut local_pv = PrincipalVariation::default();
        let mut best = Score::ALPHA;
        let mut bestmove = None;
        let original_alpha = bounds.alpha;
        let new_depth = depth - 1;

        // Quiets searched so far that did not cause a cutoff
        let mut quiets = ArrayVec::<(Piece, Square), MAX_NUM_MOVES>::new();

        /****************************************************************************************************
         * Primary move loop
         ****************************************************************************************************/
        for (i, (mv, _)) in picker.enumerate() {
            let moved = position.piece_at(mv.from());
            position.make_move(mv);

            /****************************************************************************************************
             * Principal Variation Search: https://en.wikipedia.org/wiki/Principal_variation_search#Pseudocode
             *
             * The first move of a PV node gets the full window. Every other move is searched with a null
             * window, and re-searched with the full window only if it lands inside it.
             ****************************************************************************************************/
            let score = if Node::PV && i == 0 {
                -self.negamax::<PvNode>(position, new_depth, ply + 1, -bounds, &mut local_pv)
            } else {
                let score = -self.negamax::<NonPvNode>(
                    position,
                    new_depth,
                    ply + 1,
                    -bounds.null_alpha(),
                    &mut local_pv,
                );

                if Node::PV && score > bounds.alpha && score < bounds.beta {
                    -self.negamax::<PvNode>(position, new_depth, ply + 1, -bounds, &mut local_pv)
                } else {
                    score
                }
            };

            position.unmake_move();

            // The score of an interrupted subtree is meaningless
            if self.ctx.interrupted.is_some() {
                return best;
            }

            /****************************************************************************************************
             * Score evaluation & bounds adjustments
             ****************************************************************************************************/
            if score > best {
                best = score;

                // PV found
                if score > bounds.alpha {
                    bounds.alpha = score;
                    bestmove = Some(mv);

                    if Node::PV {
                        pv.extend(mv, &local_pv);
                    }
                }

                // Fail high
                if score >= bounds.beta {
                    if mv.is_capture() || mv.is_promotion() {
                        break;
                    }

                    /****************************************************************************************************
                     * Killers & History Heuristic
                     *
                     * A quiet move that fails high is probably a good move, so siblings at this depth try it early.
                     * The quiets searched before it are penalized, since they did not cause a cutoff.
                     ****************************************************************************************************/
                    self.ctx.killers.store(depth, mv);

                    let bonus = HistoryTable::bonus(depth);
                    if let Some(piece) = moved {
                        self.ctx.history.update(piece, mv.to(), bonus);
                    }
                    for &(piece, to) in &quiets {
                        self.ctx.history.update(piece, to, -bonus);
                    }
                    break;
                }
            }

            if !mv.is_capture() && !mv.is_promotion() {
                if let Some(piece) = moved {
                    quiets.push((piece, mv.to()));
                }
            }
        }

        self.save_to_tt(
            key,
            bestmove,
            best,
            SearchBounds::new(original_alpha, bounds.beta),
            depth,
            ply,
        );

        best
    }

    /// Quiescence Search (QSearch)
    ///
    /// A search that looks at only captures (or every evasion, when in check).
    /// This is called when [`Search::negamax`] reaches a depth of 0, and has no recursion limit.
    fn quiescence(&mut self, position: &mut Position, ply: i32, mut bounds: SearchBounds) -> Score {
        if self.ctx.visit() {
            return evaluate(position);
        }

        if self.ctx.skip_quiescence() {
            return bounds.midpoint();
        }

        if self.is_draw(position) {
            return Score::DRAW;
        }

        if ply >= MAX_DEPTH as i32 {
            return evaluate(position);
        }

        let in_check = self
            .ctx
            .check_cache
            .is_in_check(position, position.side_to_move());

        let mut best = if in_check {
            // Every evasion must be considered, so there's no standing pat
            Score::mated_in(ply)
        } else {
            // Evaluate the current position, to serve as our baseline
            let stand_pat = evaluate(position);

            // Beta cutoff; this position is "too good" and our opponent would never let us get here
            if stand_pat >= bounds.beta {
                return bounds.beta;
            }
            bounds.alpha = bounds.alpha.max(stand_pat);
            stand_pat
        };

        let moves = if in_check {
            generate_check_evasions(position)
        } else {
            generate_captures(position)
        };

        let picker = {
            let position: &Position = position;
            MovePicker::new(moves, |mv| capture_value(position, *mv))
        };

        for (mv, _) in picker {
            position.make_move(mv);
            let score = -self.quiescence(position, ply + 1, -bounds);
            position.unmake_move();

            if self.ctx.interrupted.is_some() {
                return best;
            }

            if score > best {
                best = score;

                if score > bounds.alpha {
                    bounds.alpha = score;
                }

                // Fail high
                if score >= bounds.beta {
                    break;
                }
            }
        }

        best // fail-soft
    }

    /// Returns `true` if `position` is drawn by repetition, the fifty-move rule, or insufficient material.
    ///
    /// Inside the tree, a single repetition is enough; a side that could repeat can always repeat again.
    #[inline(always)]
    fn is_draw(&self, position: &Position) -> bool {
        position.is_repetition(2)
            || position.can_draw_by_fifty()
            || position.has_insufficient_material()
    }

    /// Applies a usable TT entry to `bounds`, returning a score if the node can be cut off.
    ///
    /// Exact entries return immediately. Lower bounds raise alpha, and upper bounds lower beta.
    #[inline(always)]
    fn narrow_with_tt(
        &self,
        entry: &TTableEntry,
        ply: i32,
        bounds: &mut SearchBounds,
    ) -> Option<Score> {
        if let Some(score) = entry.try_score(*bounds, ply) {
            return Some(score);
        }

        let score = entry.score_at(ply);
        match entry.bound {
            Bound::Lower => bounds.alpha = bounds.alpha.max(score),
            Bound::Upper => bounds.beta = bounds.beta.min(score),
            Bound::Exact => {}
        }

        (bounds.alpha >= bounds.beta).then_some(score)
    }

    /// Saves the provided data to an entry in the TTable.
    #[inline(always)]
    fn save_to_tt(
        &mut self,
        key: ZobristKey,
        bestmove: Option<Move>,
        score: Score,
        bounds: SearchBounds,
        depth: u8,
        ply: i32,
    ) {
        if self.ctx.config.use_ttable {
            let entry = TTableEntry::new(key, bestmove, score, bounds, depth, ply);
            self.ttable.store(entry);
        }
    }

    /// Applies a score to the provided move, intended to be used when ordering moves during search.
    ///
    /// Hash move first, then captures and promotions by MVV-LVA, then killers, then history.
    #[inline(always)]
    fn score_move(&self, position: &Position, mv: Move, tt_move: Option<Move>, depth: u8) -> i32 {
        // TT move should be looked at first, so assign it the best possible score and immediately exit.
        if tt_move == Some(mv) {
            return i32::MAX;
        }

        let capture = capture_value(position, mv);
        if capture > 0 {
            return capture;
        }

        if let Some(slot) = self.ctx.killers.slot_of(depth, mv) {
            return tune::killer_bonus!() - slot as i32;
        }

        position
            .piece_at(mv.from())
            .map_or(0, |piece| self.ctx.history[(piece, mv.to())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn run_search(fen: &str, config: SearchConfig) -> SearchResult {
        let is_searching = Arc::new(AtomicBool::new(true));
        let mut position: Position = fen.parse().unwrap();

        let mut ttable = TTable::from_capacity(1 << 16);
        Search::new(is_searching, config, &mut ttable).start(&mut position)
    }

    fn ensure_is_mate_in(fen: &str, config: SearchConfig, moves: i32) -> SearchResult {
        let res = run_search(fen, config);
        assert!(
            res.score.is_mate(),
            "Search on {fen:?} with config {config:#?} produced result that is not mate.\nResult: {res:#?}"
        );
        assert_eq!(
            res.score.moves_to_mate(),
            moves,
            "Search on {fen:?} with config {config:#?} produced result not mate in {moves}.\nResult: {res:#?}"
        );
        res
    }

    #[test]
    fn test_white_mate_in_1() {
        let fen = "k7/8/KQ6/8/8/8/8/8 w - - 0 1";
        let res = ensure_is_mate_in(fen, SearchConfig::with_depth(2), 1);

        // Several Queen moves mate here; whichever was chosen must actually mate
        let mut pos: Position = fen.parse().unwrap();
        pos.make_move(res.bestmove.unwrap());
        assert!(pos.in_check());
        assert!(generate_legal(&mut pos).is_empty());
    }

    #[test]
    fn test_black_mated_in_1() {
        let fen = "1k6/8/KQ6/2Q5/8/8/8/8 b - - 0 1";
        let res = ensure_is_mate_in(fen, SearchConfig::with_depth(3), -1);
        assert_eq!(res.bestmove.map(|mv| mv.to_string()).as_deref(), Some("b8a8"));
    }

    #[test]
    fn test_stalemate() {
        let fen = "k7/8/KQ6/8/8/8/8/8 b - - 0 1";
        let res = run_search(fen, SearchConfig::with_depth(1));
        assert!(res.bestmove.is_none());
        assert_eq!(res.score, Score::DRAW);
    }

    #[test]
    fn test_obvious_capture_promote() {
        // Pawn should take queen and also promote to queen
        let fen = "3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1";
        let res = run_search(fen, SearchConfig::with_depth(1));
        assert_eq!(res.bestmove.map(|mv| mv.to_string()).as_deref(), Some("e7d8q"));
    }

    #[test]
    fn test_zero_timeout_still_finds_move() {
        let config = SearchConfig {
            hard_timeout: Duration::ZERO,
            soft_timeout: Duration::ZERO,
            timecheck_interval: 1,
            ..Default::default()
        };
        let res = run_search(FEN_STARTPOS, config);

        assert!(res.bestmove.is_some());
        assert_eq!(res.interrupted, Some(SearchInterrupted::Timeout));
        assert_eq!(res.depth, 0);
    }

    #[test]
    fn test_clock_starts_with_the_search() {
        let config = SearchConfig {
            max_depth: 2,
            soft_timeout: Duration::from_millis(500),
            hard_timeout: Duration::from_millis(500),
            timecheck_interval: 1,
            ..Default::default()
        };

        // The config outlives its own time budget before the search begins
        std::thread::sleep(Duration::from_millis(600));
        let res = run_search(FEN_STARTPOS, config);

        assert_eq!(res.interrupted, None);
        assert_eq!(res.depth, 2);
    }

    #[test]
    fn test_pv_is_playable() {
        let res = run_search(FEN_KIWIPETE, SearchConfig::with_depth(4));
        let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();

        assert!(!res.pv.is_empty());
        assert_eq!(res.pv.first(), res.bestmove);
        for &mv in res.pv.moves() {
            assert!(is_legal(&mut pos, mv), "{mv} is illegal in {pos}");
            pos.make_move(mv);
        }
    }

    #[test]
    fn test_search_restores_position() {
        let mut position = Position::from_fen(FEN_KIWIPETE).unwrap();
        let original = position.clone();
        let mut ttable = TTable::from_capacity(1 << 12);
        let flag = Arc::new(AtomicBool::new(true));

        Search::new(flag, SearchConfig::with_depth(3), &mut ttable).start(&mut position);
        assert_eq!(position, original);
    }

    #[test]
    fn test_quiescence_skip_is_seeded() {
        let config = SearchConfig {
            max_depth: 3,
            quiescence_skip_chance: 0.5,
            seed: 42,
            ..Default::default()
        };

        let first = run_search(FEN_KIWIPETE, config);
        let second = run_search(FEN_KIWIPETE, config);
        assert_eq!(first.pv, second.pv);
        assert_eq!(first.score, second.score);
    }
}

//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StateTable                                                 │
//! │  ┌────────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ StateId    │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├────────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Idle       │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Confirming │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Running    │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Cooldown   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └────────────┴───────────┴──────────┴───────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut ChannelContext`.
//!
//! There is no way to force a transition from outside: every state
//! change is decided by a handler.  At most one transition per tick.

pub mod context;
pub mod mode;
pub mod session;
pub mod states;

use context::ChannelContext;
use log::{info, warn};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all channel states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Confirming = 1,
    Running = 2,
    Cooldown = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Out-of-range falls back to
    /// `Idle` (asserts in debug builds).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Confirming,
            2 => Self::Running,
            3 => Self::Cooldown,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// RUNNING and COOLDOWN both count as an active cycle.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Cooldown)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut ChannelContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut ChannelContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine for one channel.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Clock value at which the current state was entered.
    entered_at_ms: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            entered_at_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut ChannelContext) {
        info!(
            "CH{} FSM starting in state: {}",
            ctx.channel.number(),
            self.table[self.current].name
        );
        self.entered_at_ms = ctx.now_ms;
        ctx.ms_in_state = 0;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick using `ctx.now_ms` as the clock.
    ///
    /// 1. Refresh `ctx.ms_in_state`.
    /// 2. Call `on_update` for the current state.
    /// 3. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    ///
    /// Returns the previous state when a transition happened.
    pub fn tick(&mut self, ctx: &mut ChannelContext) -> Option<StateId> {
        if self.entered_at_ms > ctx.now_ms {
            warn!(
                "CH{}: state entry time {} is ahead of clock {}, clamping",
                ctx.channel.number(),
                self.entered_at_ms,
                ctx.now_ms
            );
            self.entered_at_ms = ctx.now_ms;
        }
        ctx.ms_in_state = ctx.now_ms - self.entered_at_ms;

        let prev = self.current_state();
        let next = (self.table[self.current].on_update)(ctx)?;
        self.transition(next, ctx);
        Some(prev)
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        self.table[self.current].id
    }

    /// Name of the current state, for logs and the status page.
    pub fn current_name(&self) -> &'static str {
        self.table[self.current].name
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut ChannelContext) {
        let next_idx = next_id as usize;

        info!(
            "CH{} FSM transition: {} -> {}",
            ctx.channel.number(),
            self.table[self.current].name,
            self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.entered_at_ms = ctx.now_ms;
        ctx.ms_in_state = 0;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

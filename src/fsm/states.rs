//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers.  No closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  IDLE ──[trigger, washer]──▶ CONFIRMING ──[held ≥ window]──▶ RUNNING
//!   │  ▲                          │                              │  ▲
//!   │  └────────[cleared]─────────┘                   [2 cleared │  │ [trigger]
//!   │                                                  ticks]    ▼  │
//!   └───────────[trigger, dryer]──────────▶ RUNNING     COOLDOWN ──┘
//!                                                           │
//!  IDLE ◀──────────────[end delay elapsed, END]─────────────┘
//! ```
//!
//! A session opens on the first entry into RUNNING and closes on the
//! entry into IDLE that follows COOLDOWN.  Bouncing between RUNNING and
//! COOLDOWN keeps the same session.

use super::context::{ChannelContext, ChannelOutput};
use super::session::{LogEvent, Session};
use super::{StateDescriptor, StateId};
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per channel at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Confirming
        StateDescriptor {
            id: StateId::Confirming,
            name: "Confirming",
            on_enter: Some(confirming_enter),
            on_exit: None,
            on_update: confirming_update,
        },
        // Index 2: Running
        StateDescriptor {
            id: StateId::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: running_update,
        },
        // Index 3: Cooldown
        StateDescriptor {
            id: StateId::Cooldown,
            name: "Cooldown",
            on_enter: Some(cooldown_enter),
            on_exit: None,
            on_update: cooldown_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut ChannelContext) {
    ctx.dip_at_ms = None;

    // Closing a session. Sub-flags go with it and are not logged.
    if let Some(session) = ctx.session.take() {
        let end = session.end_record(ctx.now_ms);
        info!(
            "CH{}: cycle finished after {} ms ({} records)",
            ctx.channel.number(),
            end.relative_ms,
            end.seq
        );
        ctx.emit(ChannelOutput::Log(end));
        ctx.emit(ChannelOutput::Indicator(false));
        ctx.emit(ChannelOutput::Status(false));
    }
}

fn idle_update(ctx: &mut ChannelContext) -> Option<StateId> {
    if !ctx.trigger_asserted() {
        return None;
    }
    if ctx.mode.has_confirm_phase() {
        Some(StateId::Confirming)
    } else {
        Some(StateId::Running)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONFIRMING state
// ═══════════════════════════════════════════════════════════════════════════

fn confirming_enter(ctx: &mut ChannelContext) {
    debug!(
        "CH{}: load seen, confirming for {} ms",
        ctx.channel.number(),
        ctx.confirm_window_ms
    );
}

fn confirming_update(ctx: &mut ChannelContext) -> Option<StateId> {
    if ctx.trigger_cleared() {
        debug!(
            "CH{}: load gone after {} ms, not a cycle",
            ctx.channel.number(),
            ctx.ms_in_state
        );
        return Some(StateId::Idle);
    }

    // Mode switched to one without a confirmation phase.
    if !ctx.mode.has_confirm_phase() {
        return ctx.trigger_asserted().then_some(StateId::Running);
    }

    if ctx.ms_in_state >= u64::from(ctx.confirm_window_ms) {
        return Some(StateId::Running);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING state
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut ChannelContext) {
    ctx.dip_at_ms = None;

    if ctx.session.is_none() {
        let session = Session::begin(ctx.now_ms);
        let start = session.start_record(ctx.now_ms);
        ctx.session = Some(session);

        info!(
            "CH{}: {:?} cycle started",
            ctx.channel.number(),
            ctx.mode
        );
        ctx.emit(ChannelOutput::Log(start));
        ctx.emit(ChannelOutput::Indicator(true));
        ctx.emit(ChannelOutput::Status(true));
    } else {
        info!("CH{}: load returned, cycle continues", ctx.channel.number());
    }

    track_subsignals(ctx);
}

fn running_update(ctx: &mut ChannelContext) -> Option<StateId> {
    track_subsignals(ctx);

    if ctx.trigger_cleared() {
        // A single low sample is ignored; two in a row start the cooldown.
        if ctx.dip_at_ms.is_some() {
            return Some(StateId::Cooldown);
        }
        ctx.dip_at_ms = Some(ctx.now_ms);
    } else if ctx.trigger_asserted() {
        ctx.dip_at_ms = None;
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLDOWN state
// ═══════════════════════════════════════════════════════════════════════════

fn cooldown_enter(ctx: &mut ChannelContext) {
    // The end delay counts from the first low sample, not from this tick.
    ctx.cooldown_since_ms = ctx.dip_at_ms.take().unwrap_or(ctx.now_ms);
    info!(
        "CH{}: load dropped, cycle ends in {} ms unless it returns",
        ctx.channel.number(),
        ctx.thresholds().end_delay_ms
    );
}

fn cooldown_update(ctx: &mut ChannelContext) -> Option<StateId> {
    track_subsignals(ctx);

    if ctx.cooldown_since_ms > ctx.now_ms {
        warn!(
            "CH{}: clock went backwards ({} > {}), restarting end delay",
            ctx.channel.number(),
            ctx.cooldown_since_ms,
            ctx.now_ms
        );
        ctx.cooldown_since_ms = ctx.now_ms;
    }

    if ctx.trigger_asserted() {
        return Some(StateId::Running);
    }

    let elapsed = ctx.now_ms - ctx.cooldown_since_ms;
    if elapsed >= u64::from(ctx.thresholds().end_delay_ms) {
        return Some(StateId::Idle);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Log an edge record for every tracked sub-signal that changed level.
fn track_subsignals(ctx: &mut ChannelContext) {
    let Some(session) = ctx.session.as_mut() else {
        return;
    };
    let thresholds = *ctx.config.thresholds(ctx.mode);

    let mut edges: heapless::Vec<LogEvent, 3> = heapless::Vec::new();
    for signal in ctx.mode.tracked() {
        let level = signal.level(&ctx.sample, &thresholds);
        if let Some(ev) = session.track(*signal, level, ctx.now_ms) {
            edges.push(ev).ok();
        }
    }

    for ev in edges {
        ctx.emit(ChannelOutput::Log(ev));
    }
}

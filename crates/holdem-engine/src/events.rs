use holdem_domain::HandEvent;

/// Operator-supplied event consumer. Emission is a synchronous callback from
/// inside engine operations; the sink must NOT call back into the engine
/// (queue and defer instead — the engine carries a debug assertion against
/// re-entry).
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &HandEvent);
}

/// Discards everything. Useful for simulations that only care about final
/// stacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &HandEvent) {}
}

//! Per-call environment handed to the registry logic.

use zkts_verifier::VerifierDirectory;

use crate::events::RegistryEvent;
use crate::transfer::ValueSink;
use crate::types::CallContext;

/// Capabilities of one in-flight call: who is calling and when, where
/// verifiers are resolved, where value goes, and the events it has emitted so
/// far. Events only reach the log if the call commits.
pub struct CallEnv<'a> {
    pub ctx: CallContext,
    pub verifiers: &'a dyn VerifierDirectory,
    pub sink: &'a mut dyn ValueSink,
    events: Vec<RegistryEvent>,
}

impl<'a> CallEnv<'a> {
    pub fn new(
        ctx: CallContext,
        verifiers: &'a dyn VerifierDirectory,
        sink: &'a mut dyn ValueSink,
    ) -> Self {
        Self {
            ctx,
            verifiers,
            sink,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: RegistryEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<RegistryEvent> {
        self.events
    }
}

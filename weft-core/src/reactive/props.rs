//! Property and event-handler bindings.
//!
//! Both are bindings whose output is the node they decorate, so they live
//! exactly as long as that node stays connected.

use std::cell::Cell;
use std::rc::Rc;

use tracing::error;

use super::signal::Signal;
use super::Runtime;
use crate::error::Result;
use crate::host::{EventHandler, Fragment, NodeRef, PropValue};

impl Runtime {
    /// Keep property `key` of `node` in sync with `value`.
    ///
    /// The current value is applied immediately and host errors from that
    /// first assignment are returned. Errors on later updates are reported
    /// as diagnostics. `PropValue::Null` removes the property.
    pub fn bind_property(&self, node: NodeRef, key: &str, value: &Signal<PropValue>) -> Result<()> {
        apply_property(self, node, key, &value.get_untracked())?;

        let key = key.to_owned();
        let value = value.clone();
        let runtime = self.downgrade();
        let first = Cell::new(true);
        self.run_binding(
            Rc::new(move |_: Option<NodeRef>| {
                let current = value.get();
                if !first.replace(false) {
                    if let Some(runtime) = Runtime::upgrade(&runtime) {
                        if let Err(err) = apply_property(&runtime, node, &key, &current) {
                            error!(
                                node = %node,
                                key = %key,
                                error = %err,
                                "failed to update property"
                            );
                            runtime.report(err.into());
                        }
                    }
                }
                Fragment::Node(node)
            }),
            None,
        );
        Ok(())
    }

    /// Keep the `event` handler of `node` in sync with `handler`.
    ///
    /// On change the previously committed handler is removed before the new
    /// one is registered. `None` leaves no handler.
    pub fn bind_event(&self, node: NodeRef, event: &str, handler: &Signal<Option<EventHandler>>) {
        if let Some(current) = handler.get_untracked() {
            self.host().add_event_listener(node, event, &current);
        }

        let event = event.to_owned();
        let handler = handler.clone();
        let runtime = self.downgrade();
        let first = Cell::new(true);
        self.run_binding(
            Rc::new(move |_: Option<NodeRef>| {
                let previous = handler.old();
                let current = handler.get();
                if !first.replace(false) {
                    if let Some(runtime) = Runtime::upgrade(&runtime) {
                        let host = runtime.host();
                        if let Some(previous) = &previous {
                            host.remove_event_listener(node, &event, previous);
                        }
                        if let Some(current) = &current {
                            host.add_event_listener(node, &event, current);
                        }
                    }
                }
                Fragment::Node(node)
            }),
            None,
        );
    }
}

fn apply_property(runtime: &Runtime, node: NodeRef, key: &str, value: &PropValue) -> Result<()> {
    match value {
        PropValue::Null => runtime.host().remove_property(node, key)?,
        value => runtime.host().set_property(node, key, value)?,
    }
    Ok(())
}

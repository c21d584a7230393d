//! Per-delivery dispatch: classify, then (for text messages) generate a reply and send it.
//!
//! Each webhook request runs this once in its own task. Nothing here writes shared state; the
//! generator and dispatcher only use their shared clients to make calls. The only suspension
//! points are the generate and send awaits.

use crate::channels::whatsapp::{classify, WebhookEnvelope};
use crate::channels::{InboundEvent, MessageDispatcher, UnrecognizedShape};
use crate::responder::ResponseGenerator;
use std::sync::Arc;

/// How the webhook request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// 200: handled, ignored, or malformed but received.
    Accepted,
    /// 404: not a WhatsApp Business delivery.
    NotFound,
}

pub struct EventDispatchPipeline {
    generator: Arc<dyn ResponseGenerator>,
    dispatcher: Arc<dyn MessageDispatcher>,
}

impl EventDispatchPipeline {
    pub fn new(generator: Arc<dyn ResponseGenerator>, dispatcher: Arc<dyn MessageDispatcher>) -> Self {
        Self {
            generator,
            dispatcher,
        }
    }

    /// Classify one delivery and act on it.
    pub async fn handle(&self, envelope: &WebhookEnvelope) -> Acknowledgement {
        let delivery_id = uuid::Uuid::new_v4();
        let event = classify(envelope);
        log::debug!("delivery {}: classified as {:?}", delivery_id, event);
        self.dispatch(&delivery_id.to_string(), event).await
    }

    /// Act on an already classified event.
    pub async fn dispatch(&self, delivery_id: &str, event: InboundEvent) -> Acknowledgement {
        match event {
            InboundEvent::TextMessage {
                sender_id, body, ..
            } => {
                log::info!("delivery {}: message from {}: {}", delivery_id, sender_id, body);
                let reply = self.generator.generate(&body).await;
                self.dispatcher.send(&sender_id, &reply).await;
                log::debug!("delivery {}: reply dispatched via {}", delivery_id, self.dispatcher.id());
                Acknowledgement::Accepted
            }
            InboundEvent::StatusUpdate { message_id, status } => {
                log::info!("delivery {}: status update: {} - {}", delivery_id, message_id, status);
                Acknowledgement::Accepted
            }
            InboundEvent::Unrecognized { shape } => match shape {
                UnrecognizedShape::ForeignObject(object) => {
                    log::warn!(
                        "delivery {}: rejecting payload with object {:?}",
                        delivery_id,
                        object
                    );
                    Acknowledgement::NotFound
                }
                UnrecognizedShape::Malformed(reason) => {
                    log::error!("delivery {}: failed to extract message value: {}", delivery_id, reason);
                    Acknowledgement::Accepted
                }
                UnrecognizedShape::UnsupportedMessage(kind) => {
                    log::info!("delivery {}: ignoring {:?} message", delivery_id, kind);
                    Acknowledgement::Accepted
                }
                UnrecognizedShape::NoEvent => {
                    log::debug!("delivery {}: no messages or statuses", delivery_id);
                    Acknowledgement::Accepted
                }
            },
        }
    }
}

use crate::message::{Notifier, SyncMessage};

/// Wraps a notifier and logs every outbound message before forwarding it.
pub struct LoggingNotifier<N> {
    inner: N,
}

impl<N: Notifier> LoggingNotifier<N> {
    pub fn new(inner: N) -> Self {
        LoggingNotifier { inner }
    }

    pub fn into_inner(self) -> N {
        self.inner
    }
}

impl<N: Notifier> Notifier for LoggingNotifier<N> {
    fn send_message(&self, message: SyncMessage) {
        log::debug!("[Sync] {:?}", message);
        self.inner.send_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    #[test]
    fn forwards_to_inner() {
        let (tx, rx) = unbounded::<SyncMessage>();
        let notifier = LoggingNotifier::new(tx);
        notifier.send_message(SyncMessage::RemoveToy { id: 2 });
        assert_eq!(rx.try_recv().unwrap(), SyncMessage::RemoveToy { id: 2 });
    }
}

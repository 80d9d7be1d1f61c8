//! Generation counter for discarding work issued against superseded inputs.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared counter bumped whenever the layout inputs change.
///
/// Clones share the counter. Work issued under a [`Ticket`] may only touch a
/// surface while that ticket is still current.
#[derive(Clone, Debug)]
pub struct Generation {
    counter: Arc<watch::Sender<u64>>,
}

impl Default for Generation {
    fn default() -> Self {
        let (counter, _) = watch::channel(0);
        Self {
            counter: Arc::new(counter),
        }
    }
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The generation a fresh ticket would have to match.
    pub fn current(&self) -> u64 {
        *self.counter.borrow()
    }

    /// Supersede every outstanding ticket. Returns the new generation.
    pub fn invalidate(&self) -> u64 {
        let mut next = 0;
        self.counter.send_modify(|generation| {
            *generation += 1;
            next = *generation;
        });
        next
    }

    /// Supersede every outstanding ticket and issue one for the new generation.
    pub fn advance(&self) -> Ticket {
        self.invalidate();
        self.ticket()
    }

    /// A ticket for the current generation, leaving outstanding ones valid.
    pub fn ticket(&self) -> Ticket {
        let watcher = self.counter.subscribe();
        let issued = *watcher.borrow();
        Ticket { watcher, issued }
    }
}

/// Proof that work was requested under a particular generation.
#[derive(Clone, Debug)]
pub struct Ticket {
    watcher: watch::Receiver<u64>,
    issued: u64,
}

impl Ticket {
    /// The generation this ticket was issued for.
    pub fn generation(&self) -> u64 {
        self.issued
    }

    /// False once anything has advanced or invalidated the generation.
    pub fn is_current(&self) -> bool {
        *self.watcher.borrow() == self.issued
    }

    /// Resolves once the ticket stops being current.
    ///
    /// Never resolves if every [`Generation`] handle is dropped first, since
    /// nothing can supersede the ticket after that.
    pub async fn superseded(&self) {
        let mut watcher = self.watcher.clone();
        while *watcher.borrow_and_update() == self.issued {
            if watcher.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        }
    }
}

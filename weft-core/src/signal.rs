// weft-core/src/signal.rs

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// A registered reactive callback.
struct Effect {
    run: RefCell<Box<dyn FnMut()>>,
    active: Cell<bool>,
    // Bumped before every run; a subscription only counts for the run that
    // made it.
    epoch: Cell<u64>,
}

type EffectRef = Rc<Effect>;

// The effect collecting dependencies right now, plus the run queue.
thread_local! {
    static CURRENT_EFFECT: RefCell<Option<EffectRef>> = const { RefCell::new(None) };

    static EFFECT_QUEUE: RefCell<Vec<EffectRef>> = const { RefCell::new(Vec::new()) };
    static QUEUED: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
    static IS_FLUSHING: Cell<bool> = const { Cell::new(false) };
}

fn ptr_id(eff: &EffectRef) -> usize {
    Rc::as_ptr(eff) as usize
}

fn enqueue_effect(eff: EffectRef) {
    if !eff.active.get() {
        return;
    }
    let fresh = QUEUED.with(|set| set.borrow_mut().insert(ptr_id(&eff)));
    if fresh {
        EFFECT_QUEUE.with(|q| q.borrow_mut().push(eff));
    }
}

/// Runs `eff` with dependency collection enabled, restoring whatever effect
/// was collecting before.
fn run_tracked(eff: &EffectRef) {
    // Move the closure out so the body can freely set signals (and thereby
    // re-enqueue this very effect) without a live borrow on it.
    let mut func: Box<dyn FnMut()> = std::mem::replace(&mut *eff.run.borrow_mut(), Box::new(|| {}));

    eff.epoch.set(eff.epoch.get() + 1);
    let outer = CURRENT_EFFECT.with(|cur| cur.replace(Some(eff.clone())));
    func();
    CURRENT_EFFECT.with(|cur| *cur.borrow_mut() = outer);

    // A stopped effect lets go of its closure and everything it captured.
    if eff.active.get() {
        *eff.run.borrow_mut() = func;
    }
}

fn is_current(eff: &EffectRef, epoch: u64) -> bool {
    eff.active.get() && eff.epoch.get() == epoch
}

fn flush_queue() {
    // Effects scheduled during a flush are picked up by the outer loop, so a
    // tick never starts while another one is still running.
    if IS_FLUSHING.with(|f| f.replace(true)) {
        return;
    }

    loop {
        let next = EFFECT_QUEUE.with(|q| q.borrow_mut().pop());
        let Some(eff) = next else { break };

        QUEUED.with(|set| {
            set.borrow_mut().remove(&ptr_id(&eff));
        });

        if eff.active.get() {
            run_tracked(&eff);
        }
    }

    IS_FLUSHING.with(|f| f.set(false));
}

/// A reactive cell wrapping a `T: Clone`.
///
/// Reading with [`Signal::get`] inside an [`effect`] subscribes that effect;
/// [`Signal::set`] re-runs every subscriber.
pub struct Signal<T> {
    value: RefCell<T>,
    // Each subscriber with the epoch of the run that read this signal.
    subscribers: RefCell<Vec<(EffectRef, u64)>>,
}

impl<T> Signal<T>
where
    T: Clone,
{
    pub fn new(initial: T) -> Self {
        Self {
            value: RefCell::new(initial),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Read the value and subscribe the running effect, if any.
    pub fn get(&self) -> T {
        CURRENT_EFFECT.with(|current| {
            if let Some(eff) = current.borrow().as_ref() {
                let mut subs = self.subscribers.borrow_mut();
                match subs.iter_mut().find(|(e, _)| Rc::ptr_eq(e, eff)) {
                    Some((_, epoch)) => *epoch = eff.epoch.get(),
                    None => subs.push((eff.clone(), eff.epoch.get())),
                }
            }
        });
        self.value.borrow().clone()
    }

    /// Read the value without subscribing anybody.
    pub fn peek(&self) -> T {
        self.value.borrow().clone()
    }

    /// Replace the value and run the effects that read it on their latest
    /// run.
    pub fn set(&self, new: T) {
        *self.value.borrow_mut() = new;

        let subscribers: Vec<EffectRef> = {
            let mut subs = self.subscribers.borrow_mut();
            subs.retain(|(e, epoch)| is_current(e, *epoch));
            subs.iter().map(|(e, _)| e.clone()).collect()
        };

        for subscriber in subscribers {
            enqueue_effect(subscriber);
        }
        flush_queue();
    }

    /// Number of live effects that read this signal on their latest run.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|(e, epoch)| is_current(e, *epoch))
            .count()
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&*self.value.borrow()).finish()
    }
}

/// Handle returned by [`effect`]; stopping it detaches the callback from all
/// of its signals.
#[derive(Clone)]
pub struct EffectHandle {
    eff: EffectRef,
}

impl EffectHandle {
    pub fn stop(&self) {
        self.eff.active.set(false);
        // Outside a run this drops the closure now; inside one `run_tracked`
        // drops it on the way out.
        if let Ok(mut run) = self.eff.run.try_borrow_mut() {
            *run = Box::new(|| {});
        }
    }

    pub fn is_active(&self) -> bool {
        self.eff.active.get()
    }
}

impl fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectHandle").field("active", &self.is_active()).finish()
    }
}

/// Register `f` as a reactive effect (track-and-run):
/// - runs immediately, recording every `Signal` it reads,
/// - runs again whenever one of those signals is `set()`.
pub fn effect<F>(f: F) -> EffectHandle
where
    F: FnMut() + 'static,
{
    let eff = Rc::new(Effect {
        run: RefCell::new(Box::new(f)),
        active: Cell::new(true),
        epoch: Cell::new(0),
    });
    run_tracked(&eff);
    EffectHandle { eff }
}

/// Run `f` with dependency collection switched off.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let outer = CURRENT_EFFECT.with(|cur| cur.replace(None));
    let out = f();
    CURRENT_EFFECT.with(|cur| *cur.borrow_mut() = outer);
    out
}

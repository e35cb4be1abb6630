/*!
Master clock: wall-clock-paced tick distributor.

Every chip in the console derives its clock from one master oscillator
(21.47727 MHz NTSC). Consumers register a listener with a divider and a
phase offset; the scheduler keeps listeners in a list ordered by next-due
tick, pops the earliest, sleeps until its due tick if needed, invokes it,
and reinserts it at `next_due += divider * periods_consumed`. Callbacks
report how many of their own periods they consumed, which lets the CPU
listener account a whole variable-length instruction per invocation.

Pacing never trusts a sleep call: after waking, the elapsed wall time is
re-measured and the master position advanced from the measurement, so
oversleeping self-corrects on the following scheduling decisions. The time
source is injectable, which is what the deterministic tests use.
*/

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// NTSC master oscillator, in Hz. The CPU divides this by 12, the PPU by 4.
pub const NTSC_MASTER_HZ: u64 = 21_477_470;
/// PAL master oscillator, in Hz.
pub const PAL_MASTER_HZ: u64 = 26_601_700;

/// CPU divider from the master clock.
pub const CPU_DIVIDER: u64 = 12;
/// PPU divider from the master clock.
pub const PPU_DIVIDER: u64 = 4;

/// Clock source abstraction so tests can run the scheduler on fake time.
pub trait TimeSource {
    /// Monotonic time since an arbitrary epoch.
    fn now(&mut self) -> Duration;
    /// Block for roughly `d`. Accuracy is not assumed anywhere.
    fn sleep(&mut self, d: Duration);
}

/// Real time: `Instant` plus `thread::sleep`.
pub struct SystemTime {
    origin: Instant,
}

impl Default for SystemTime {
    fn default() -> Self {
        SystemTime {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTime {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Deterministic time for tests: `sleep` advances `now` by exactly the
/// requested amount.
#[derive(Default)]
pub struct FakeTime {
    now: Duration,
}

impl TimeSource for FakeTime {
    fn now(&mut self) -> Duration {
        self.now
    }

    fn sleep(&mut self, d: Duration) {
        self.now += d;
    }
}

/// Listener callback: receives the number of elapsed periods (currently
/// always 1) and returns the number of its own periods it consumed.
pub type ClockCallback = Box<dyn FnMut(u64) -> u64>;

struct Listener {
    divider: u64,
    next_due: u64,
    cb: ClockCallback,
}

/// Run-state gate for the scheduling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
    /// Dispatch exactly one listener, then stop.
    SingleStep,
}

/// Handle for gating the loop from inside a callback or from frontend code.
///
/// Stopping through the handle never discards scheduling state; a later
/// `run` resumes with every listener where it left off.
#[derive(Clone)]
pub struct ClockControl {
    state: Rc<Cell<ClockState>>,
}

impl ClockControl {
    pub fn stop(&self) {
        self.state.set(ClockState::Stopped);
    }

    pub fn one_step(&self) {
        self.state.set(ClockState::SingleStep);
    }

    pub fn state(&self) -> ClockState {
        self.state.get()
    }
}

/// The master clock scheduler.
pub struct MasterClock {
    /// Master ticks accounted per pacing interval.
    step: u64,
    /// Wall-clock duration of one pacing interval, in nanoseconds.
    interval_ns: u64,
    /// Master tick position.
    pos: u64,
    /// Wall-clock position matching `pos`, in nanoseconds.
    last_ns: u64,
    listeners: Vec<Listener>,
    state: Rc<Cell<ClockState>>,
    time: Box<dyn TimeSource>,
}

impl MasterClock {
    /// Clock running at `freq` Hz against real time.
    pub fn new(freq: u64) -> Self {
        Self::with_time_source(freq, Box::new(SystemTime::default()))
    }

    /// Clock running at `freq` Hz against an injected time source.
    pub fn with_time_source(freq: u64, mut time: Box<dyn TimeSource>) -> Self {
        let (step, interval_ns) = best_step(freq);
        let real = NANOS_PER_SEC * step / interval_ns;
        log::debug!(
            "clock: requested {} Hz, pacing at {} Hz ({} ticks per {} ns interval)",
            freq,
            real,
            step,
            interval_ns
        );
        let last_ns = duration_ns(time.now());
        MasterClock {
            step,
            interval_ns,
            pos: 0,
            last_ns,
            listeners: Vec::new(),
            state: Rc::new(Cell::new(ClockState::Stopped)),
            time,
        }
    }

    /// Current master tick position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Gate handle shared with callbacks and frontends.
    pub fn control(&self) -> ClockControl {
        ClockControl {
            state: self.state.clone(),
        }
    }

    /// Register `cb` to run every `divider` master ticks, offset by `phase`.
    ///
    /// The first due tick is the next divider boundary after the current
    /// position, plus the phase. Phases order co-due listeners: the CPU
    /// registers at phase 0 and the PPU at phase 1, so within any shared
    /// window the CPU instruction lands first and the PPU catches up.
    pub fn listen(&mut self, divider: u64, phase: u64, cb: ClockCallback) {
        assert!(divider > 0, "listener divider must be non-zero");
        let next_due = (self.pos / divider + 1) * divider + phase;
        self.insert(Listener {
            divider,
            next_due,
            cb,
        });
    }

    /// Run paced against the time source until the gate reads `Stopped`.
    ///
    /// A gate pre-set to `SingleStep` dispatches one listener and stops.
    pub fn run(&mut self) {
        if self.state.get() == ClockState::Stopped {
            self.state.set(ClockState::Running);
        }
        self.last_ns = duration_ns(self.time.now());
        loop {
            match self.state.get() {
                ClockState::Stopped => break,
                ClockState::SingleStep => {
                    self.dispatch_next(true);
                    self.state.set(ClockState::Stopped);
                    break;
                }
                ClockState::Running => self.dispatch_next(true),
            }
        }
    }

    /// Dispatch exactly one due listener without wall-clock pacing.
    ///
    /// The master position jumps straight to the listener's due tick. This
    /// is the single-step entry point and the workhorse of deterministic
    /// tests and headless batch runs.
    pub fn step_one(&mut self) {
        self.dispatch_next(false);
    }

    fn dispatch_next(&mut self, pace: bool) {
        if self.listeners.is_empty() {
            // Nothing scheduled; idle briefly rather than spin.
            if pace {
                self.time.sleep(Duration::from_millis(50));
                self.last_ns = duration_ns(self.time.now());
            }
            return;
        }
        let mut l = self.listeners.remove(0);
        if l.next_due > self.pos {
            if pace {
                self.pace_until(l.next_due);
            } else {
                self.pos = l.next_due;
            }
        }
        let consumed = (l.cb)(1).max(1);
        l.next_due += l.divider * consumed;
        self.insert(l);
    }

    /// Advance wall-clock and master position until `pos >= due`.
    fn pace_until(&mut self, due: u64) {
        let needed_ticks = due - self.pos;
        let needed_intervals = needed_ticks.div_ceil(self.step);
        let target_ns = needed_intervals * self.interval_ns;

        let now_ns = duration_ns(self.time.now());
        let elapsed_ns = now_ns.saturating_sub(self.last_ns);
        let awake_ns = if elapsed_ns < target_ns {
            self.time.sleep(Duration::from_nanos(target_ns - elapsed_ns));
            // Sleep durations are never trusted; measure what passed.
            duration_ns(self.time.now())
        } else {
            now_ns
        };

        // Whole pacing intervals that actually elapsed, floored so that
        // leftover time stays accounted in `last_ns` for the next decision.
        let measured = awake_ns.saturating_sub(self.last_ns) / self.interval_ns;
        let intervals = measured.max(needed_intervals);
        self.pos += intervals * self.step;
        self.last_ns += intervals * self.interval_ns;
    }

    fn insert(&mut self, l: Listener) {
        let at = self
            .listeners
            .partition_point(|x| x.next_due <= l.next_due);
        self.listeners.insert(at, l);
    }
}

const NANOS_PER_SEC: u64 = 1_000_000_000;

fn duration_ns(d: Duration) -> u64 {
    d.as_nanos() as u64
}

/// Pick the tick batch size whose integer-nanosecond interval best
/// approximates `freq`. One tick of a 21.47 MHz clock is shorter than a
/// nanosecond timer can express, so pacing works in batches of `step`
/// ticks; larger steps reduce rounding error at the cost of burstiness.
fn best_step(freq: u64) -> (u64, u64) {
    let mut best = (1u64, NANOS_PER_SEC.max(1));
    let mut best_diff = u64::MAX;
    for step in 1..255u64 {
        let interval_ns = NANOS_PER_SEC * step / freq;
        if interval_ns == 0 {
            continue;
        }
        let real = NANOS_PER_SEC * step / interval_ns;
        let diff = real.abs_diff(freq);
        if diff < best_diff {
            best = (step, interval_ns);
            best_diff = diff;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn fake_clock(freq: u64) -> MasterClock {
        MasterClock::with_time_source(freq, Box::new(FakeTime::default()))
    }

    #[test]
    fn first_due_tick_follows_divider_and_phase() {
        let mut clk = fake_clock(1_000_000);
        let fired = Rc::new(RefCell::new(Vec::new()));

        let f = fired.clone();
        clk.listen(4, 1, Box::new(move |_| {
            f.borrow_mut().push(());
            1
        }));

        assert_eq!(clk.listeners[0].next_due, 5);
    }

    #[test]
    fn cpu_before_ppu_in_every_shared_window() {
        // Dividers {12, 4} with phases {0, 1}: within any 12-tick window
        // the divider-12 listener must land before the divider-4 one.
        let mut clk = fake_clock(1_000_000);
        let order: Rc<RefCell<Vec<char>>> = Rc::new(RefCell::new(Vec::new()));

        // Registration order is ppu first to prove ordering comes from due
        // ticks, not insertion.
        let o = order.clone();
        clk.listen(4, 1, Box::new(move |_| {
            o.borrow_mut().push('p');
            1
        }));
        let o = order.clone();
        clk.listen(12, 0, Box::new(move |_| {
            o.borrow_mut().push('c');
            1
        }));

        for _ in 0..64 {
            clk.step_one();
        }

        // Per 12-tick window there are three 'p' events and one 'c', and
        // 'c' (due 12k) precedes the 'p' due 12k+1.
        let seq: Vec<char> = order.borrow().clone();
        // First window: p@5, p@9, then c@12 before p@13.
        assert_eq!(&seq[..5], &['p', 'p', 'c', 'p', 'p']);
        // Steady state: every 'c' is immediately followed by a 'p'.
        for (i, &ev) in seq.iter().enumerate() {
            if ev == 'c' && i + 1 < seq.len() {
                assert_eq!(seq[i + 1], 'p', "window around event {i} out of order");
            }
        }
    }

    #[test]
    fn consumed_periods_scale_the_reschedule() {
        let mut clk = fake_clock(1_000_000);
        let count = Rc::new(Cell::new(0u32));

        let c = count.clone();
        // Consumes 3 periods per call, like a 3-cycle CPU instruction.
        clk.listen(12, 0, Box::new(move |_| {
            c.set(c.get() + 1);
            3
        }));

        clk.step_one();
        assert_eq!(clk.position(), 12);
        assert_eq!(clk.listeners[0].next_due, 12 + 36);

        clk.step_one();
        assert_eq!(clk.position(), 48);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn paced_run_advances_fake_time() {
        let mut clk = fake_clock(1_000_000); // 1 MHz: 1 tick per microsecond
        let control = clk.control();

        let hits = Rc::new(Cell::new(0u32));
        let h = hits.clone();
        let ctl = control.clone();
        clk.listen(1000, 0, Box::new(move |_| {
            h.set(h.get() + 1);
            if h.get() == 5 {
                ctl.stop();
            }
            1
        }));

        clk.run();
        assert_eq!(hits.get(), 5);
        // Five invocations at 1 kHz on a 1 MHz clock: 5000 ticks.
        assert_eq!(clk.position(), 5000);
    }

    #[test]
    fn single_step_dispatches_exactly_one_listener() {
        let mut clk = fake_clock(1_000_000);
        let hits = Rc::new(Cell::new(0u32));
        let h = hits.clone();
        clk.listen(10, 0, Box::new(move |_| {
            h.set(h.get() + 1);
            1
        }));

        // run() honors a pre-set single-step gate.
        clk.control().one_step();
        clk.run();
        assert_eq!(hits.get(), 1);
        assert_eq!(clk.control().state(), ClockState::Stopped);
    }

    #[test]
    fn stop_preserves_scheduling_state() {
        let mut clk = fake_clock(1_000_000);
        let c = clk.control();
        clk.listen(10, 0, Box::new(move |_| {
            c.stop();
            1
        }));

        clk.run();
        let pos_after_first = clk.position();
        assert_eq!(pos_after_first, 10);

        // Resuming picks up the same listener at its reinserted due tick.
        let ctl2 = clk.control();
        clk.listen(10_000, 0, Box::new(move |_| {
            ctl2.stop();
            1
        }));
        clk.run();
        assert!(clk.position() >= 20);
    }
}

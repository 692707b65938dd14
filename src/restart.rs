//! Glucose-style exponential moving averages driving the restart
//! heuristic, ported from the teacher's `restart::Ema`/`Ema2`.

#[derive(Clone, Debug)]
pub struct Ema {
    val: f64,
    window: f64,
}

impl Ema {
    pub fn new(window: usize) -> Ema {
        Ema {
            val: 0.0,
            window: window as f64,
        }
    }

    pub fn get(&self) -> f64 {
        self.val
    }

    pub fn update(&mut self, x: f64) {
        self.val += (x - self.val) / self.window;
    }

    pub fn reset(&mut self) {
        self.val = 0.0;
    }
}

/// A fast/slow EMA pair, used to decide blocking restarts (fast >>
/// slow means the search is still making quick progress, so a
/// requested restart is suppressed).
#[derive(Clone, Debug)]
pub struct Ema2 {
    pub fast: Ema,
    pub slow: Ema,
}

impl Ema2 {
    pub fn new(fast_window: usize, slow_window: usize) -> Ema2 {
        Ema2 {
            fast: Ema::new(fast_window),
            slow: Ema::new(slow_window),
        }
    }

    pub fn update(&mut self, x: f64) {
        self.fast.update(x);
        self.slow.update(x);
    }

    pub fn trend(&self) -> f64 {
        if self.slow.get() == 0.0 {
            1.0
        } else {
            self.fast.get() / self.slow.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_converges_towards_constant_input() {
        let mut e = Ema::new(10);
        for _ in 0..200 {
            e.update(5.0);
        }
        assert!((e.get() - 5.0).abs() < 1e-6);
    }
}

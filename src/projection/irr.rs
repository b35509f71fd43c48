//! Internal rate of return and net present value for periodic cash flows
//!
//! Rates here are per period. Quarterly streams are annualized as `(1 + r)^4 - 1`.

/// Lower search bound for a periodic rate (a near-total loss)
const RATE_FLOOR: f64 = -0.99;
/// Upper search bound for a periodic rate
const RATE_CEILING: f64 = 10.0;
/// Starting guess for Newton-Raphson, about 8% a year on quarterly data
const INITIAL_GUESS: f64 = 0.02;
const STEP_TOLERANCE: f64 = 1e-10;
const ROOT_TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 1000;
/// Flows smaller than this count as zero when looking for a sign change
const FLOW_EPSILON: f64 = 1e-10;

/// Annual IRR of a stream whose first flow sits at t = 0
///
/// `periods_per_year` is 4 for quarterly streams. Returns `None` when the stream
/// has no sign change or no root between the search bounds.
pub fn calculate_irr(cashflows: &[f64], periods_per_year: u32) -> Option<f64> {
    periodic_irr(cashflows).map(|rate| annualize(rate, periods_per_year))
}

/// Compound a periodic rate into an annual effective rate
pub fn annualize(periodic_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + periodic_rate).powi(periods_per_year as i32) - 1.0
}

/// Per-period IRR by Newton-Raphson, falling back to bisection
///
/// An all-zero stream is solved by every rate, so it has no IRR either.
pub fn periodic_irr(cashflows: &[f64]) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }
    let inflows = cashflows.iter().any(|&cf| cf > FLOW_EPSILON);
    let outflows = cashflows.iter().any(|&cf| cf < -FLOW_EPSILON);
    if !(inflows && outflows) {
        return None;
    }

    newton(cashflows).or_else(|| bisect(cashflows))
}

fn newton(cashflows: &[f64]) -> Option<f64> {
    let mut rate = INITIAL_GUESS;

    for _ in 0..MAX_ITERATIONS {
        let (value, slope) = npv_with_slope(cashflows, rate);
        if slope.abs() < 1e-20 {
            return None;
        }

        let next = (rate - value / slope).clamp(RATE_FLOOR, RATE_CEILING);
        if (next - rate).abs() < STEP_TOLERANCE {
            // A step that stalls against a bound is not a root
            return (npv_at_rate(cashflows, next).abs() < ROOT_TOLERANCE).then_some(next);
        }
        rate = next;
    }

    None
}

/// NPV and dNPV/dr at `rate`
fn npv_with_slope(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let growth = 1.0 + rate;
    cashflows
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(value, slope), (t, &cf)| {
            let discounted = cf / growth.powi(t as i32);
            (value + discounted, slope - t as f64 * discounted / growth)
        })
}

fn bisect(cashflows: &[f64]) -> Option<f64> {
    let (mut low, mut high) = (RATE_FLOOR, RATE_CEILING);
    let mut value_low = npv_at_rate(cashflows, low);

    if value_low * npv_at_rate(cashflows, high) > 0.0 {
        return None;
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = 0.5 * (low + high);
        let value_mid = npv_at_rate(cashflows, mid);

        if value_mid.abs() < STEP_TOLERANCE || 0.5 * (high - low) < STEP_TOLERANCE {
            return Some(mid);
        }
        if value_mid * value_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            value_low = value_mid;
        }
    }

    None
}

/// NPV at a periodic rate; the first flow is not discounted
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    let growth = 1.0 + rate;
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / growth.powi(t as i32))
        .sum()
}

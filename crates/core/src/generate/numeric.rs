use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{Category, OPTION_COUNT, QuizItem};

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const PROFIT_PERCENTS: [u32; 6] = [10, 12, 15, 20, 25, 30];

/// Span of the jitter used to refill distractors after deduplication.
const JITTER_SPAN: f64 = 3.0;

/// Generate one item for the given category.
pub fn generate<R: Rng + ?Sized>(category: Category, rng: &mut R) -> QuizItem {
    match category {
        Category::TimeWork => time_and_work(rng),
        Category::SpeedDistance => speed_and_distance(rng),
        Category::ProfitLoss => profit_and_loss(rng),
        Category::Calendar => calendar(rng),
        Category::SimpleInterest => simple_interest(rng),
        Category::CompoundInterest => compound_interest(rng),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format with at most two decimal places, trimming trailing zeros
/// (10.50 → "10.5", 10.00 → "10").
fn fmt2(value: f64) -> String {
    let mut text = format!("{:.2}", round2(value));
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}

/// Four mutually distinct formatted values, the correct one first.
///
/// Candidates are deduplicated as formatted strings; while fewer than four
/// survive, small random jitters around the correct value fill the gap.
fn four_unique<R: Rng + ?Sized>(correct: f64, candidates: &[f64], rng: &mut R) -> Vec<String> {
    let mut values = vec![fmt2(correct)];
    for &candidate in candidates {
        let text = fmt2(candidate);
        if !values.contains(&text) {
            values.push(text);
        }
    }
    values.truncate(OPTION_COUNT);
    while values.len() < OPTION_COUNT {
        let text = fmt2(correct + rng.random::<f64>() * JITTER_SPAN);
        if !values.contains(&text) {
            values.push(text);
        }
    }
    values
}

/// Label each numeric value, shuffle, and build the item.
fn build_item<R: Rng + ?Sized>(
    rng: &mut R,
    category: Category,
    question: String,
    values: Vec<String>,
    label: impl Fn(&str) -> String,
    solution: String,
) -> QuizItem {
    let correct_answer = label(&values[0]);
    let mut options: Vec<String> = values.iter().map(|value| label(value)).collect();
    options.shuffle(rng);
    QuizItem::from_generated(
        category.display_name(),
        question,
        correct_answer,
        options,
        solution,
    )
}

fn time_and_work<R: Rng + ?Sized>(rng: &mut R) -> QuizItem {
    let a = rng.random_range(6..=18_u32);
    let b = rng.random_range(8..=24_u32);
    let together = round2(f64::from(a * b) / f64::from(a + b));
    let offset = f64::from(rng.random_range(1..=4_u32));
    let values = four_unique(
        together,
        &[together * 2.0, together * 0.5, together + offset],
        rng,
    );
    build_item(
        rng,
        Category::TimeWork,
        format!(
            "A alone can finish a work in {a} days and B alone in {b} days. \
             In how many days can they finish the work together?"
        ),
        values,
        |value| format!("{value} days"),
        format!(
            "Rates: A = 1/{a}, B = 1/{b} work/day. Together = 1/{a} + 1/{b} = {sum}/{product}. \
             Time = {product}/{sum} = {together} days.",
            sum = a + b,
            product = a * b,
            together = fmt2(together),
        ),
    )
}

fn speed_and_distance<R: Rng + ?Sized>(rng: &mut R) -> QuizItem {
    let speed = rng.random_range(30..=80_u32);
    let distance = rng.random_range(90..=320_u32);
    let time = round2(f64::from(distance) / f64::from(speed));
    let values = four_unique(time, &[time + 0.5, time - 0.5, time * 1.5], rng);
    build_item(
        rng,
        Category::SpeedDistance,
        format!("A car travels {distance} km at {speed} km/h. How many hours does it take?"),
        values,
        |value| format!("{value} hours"),
        format!(
            "Use t = d / s. t = {distance} / {speed} = {time} hours.",
            time = fmt2(time),
        ),
    )
}

fn profit_and_loss<R: Rng + ?Sized>(rng: &mut R) -> QuizItem {
    let cost = rng.random_range(80..=900_u32);
    let percent = PROFIT_PERCENTS[rng.random_range(0..PROFIT_PERCENTS.len())];
    let selling = round2(f64::from(cost) * (1.0 + f64::from(percent) / 100.0));
    let up = f64::from(rng.random_range(5..=40_u32));
    let down = f64::from(rng.random_range(5..=40_u32));
    let values = four_unique(selling, &[selling + up, selling - down, selling * 1.1], rng);
    build_item(
        rng,
        Category::ProfitLoss,
        format!("An item costs ₹{cost}. If it is sold at a profit of {percent}%, find the selling price."),
        values,
        |value| format!("₹{value}"),
        format!(
            "SP = CP × (1 + profit/100) = {cost} × (1 + {percent}/100) = ₹{selling}.",
            selling = fmt2(selling),
        ),
    )
}

fn calendar<R: Rng + ?Sized>(rng: &mut R) -> QuizItem {
    let start_index = rng.random_range(0..WEEKDAYS.len());
    let offset = rng.random_range(1..=200_usize);
    let start = WEEKDAYS[start_index];
    let answer = WEEKDAYS[(start_index + offset) % 7];

    let mut options = vec![answer.to_owned()];
    for _ in 0..OPTION_COUNT - 1 {
        let day = WEEKDAYS[rng.random_range(0..WEEKDAYS.len())].to_owned();
        if !options.contains(&day) {
            options.push(day);
        }
    }
    while options.len() < OPTION_COUNT {
        let day = WEEKDAYS[rng.random_range(0..WEEKDAYS.len())].to_owned();
        if !options.contains(&day) {
            options.push(day);
        }
    }
    options.shuffle(rng);

    QuizItem::from_generated(
        Category::Calendar.display_name(),
        format!("If today is {start}, what day will it be after {offset} days?"),
        answer.to_owned(),
        options,
        format!(
            "Each 7 days the weekday repeats. {offset} mod 7 = {rem}. \
             {start} + {rem} days is {answer}.",
            rem = offset % 7,
        ),
    )
}

fn simple_interest<R: Rng + ?Sized>(rng: &mut R) -> QuizItem {
    let principal = rng.random_range(500..=5000_u32);
    let rate = rng.random_range(3..=15_u32);
    let term = rng.random_range(1..=5_u32);
    let interest = round2(f64::from(principal * rate * term) / 100.0);
    let up = f64::from(rng.random_range(20..=80_u32));
    let down = f64::from(rng.random_range(10..=40_u32));
    let values = four_unique(
        interest,
        &[interest + up, interest - down, interest * 1.25],
        rng,
    );
    build_item(
        rng,
        Category::SimpleInterest,
        format!("Find the simple interest on ₹{principal} at {rate}% per annum for {term} years."),
        values,
        |value| format!("₹{value}"),
        format!(
            "SI = (P×R×T)/100 = ({principal}×{rate}×{term})/100 = ₹{interest}.",
            interest = fmt2(interest),
        ),
    )
}

fn compound_interest<R: Rng + ?Sized>(rng: &mut R) -> QuizItem {
    let principal = rng.random_range(500..=5000_u32);
    let rate = rng.random_range(3..=12_u32);
    let term = rng.random_range(1..=3_i32);
    let amount = round2(f64::from(principal) * (1.0 + f64::from(rate) / 100.0).powi(term));
    let interest = round2(amount - f64::from(principal));
    let up = f64::from(rng.random_range(20..=100_u32));
    let down = f64::from(rng.random_range(10..=40_u32));
    let values = four_unique(
        interest,
        &[interest + up, interest * 1.3, interest - down],
        rng,
    );
    build_item(
        rng,
        Category::CompoundInterest,
        format!("What is the compound interest on ₹{principal} at {rate}% per annum for {term} years?"),
        values,
        |value| format!("₹{value}"),
        format!(
            "A = P(1 + r/100)^t = {principal}(1 + {rate}/100)^{term} = ₹{amount}. \
             CI = A − P = ₹{interest}.",
            amount = fmt2(amount),
            interest = fmt2(interest),
        ),
    )
}

/// Positive root of a*x^2 + b*x + c = 0. Returns NAN when the
/// discriminant is negative; degrades to the linear solution when a = 0.
pub fn quadratic_plus(a: f64, b: f64, c: f64) -> f64 {
    let d = b * b - 4.0 * a * c;
    if d < 0f64 {
        f64::NAN
    } else if a == 0f64 {
        -c / b
    } else {
        (-b + d.sqrt()) / (2.0 * a)
    }
}

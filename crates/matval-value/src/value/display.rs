use std::fmt;

use matval_array::{engine_config, DenseArray, SparseArray};
use num_complex::Complex64;

use super::Value;
use crate::int::with_int_array;

/// Short-g formatting with `precision` significant digits.
pub fn format_number(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-Inf"
        } else {
            "Inf"
        }
        .to_string();
    }
    // Normalize -0.0 to 0
    let v = if value == 0.0 { 0.0 } else { value };
    let abs = v.abs();
    if abs == 0.0 {
        return "0".to_string();
    }
    let precision = precision.clamp(1, 16);

    let upper = 10f64.powi(precision as i32);
    if !(1e-5..upper).contains(&abs) {
        let s = format!("{:.*e}", precision - 1, v);
        if let Some(idx) = s.find('e') {
            let (mantissa, exp) = s.split_at(idx);
            return format!("{}{exp}", trim_fraction(mantissa));
        }
        return s;
    }

    let exp10 = abs.log10().floor() as i32;
    let decimals = (precision as i32 - 1 - exp10).clamp(0, 16) as usize;
    let s = format!("{v:.decimals$}");
    let s = trim_fraction(&s);
    if s.is_empty() || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.')
}

fn format_complex(z: Complex64, precision: usize) -> String {
    let re = format_number(z.re, precision);
    let im = format_number(z.im.abs(), precision);
    let sign = if z.im.is_sign_negative() && !z.im.is_nan() {
        '-'
    } else {
        '+'
    };
    format!("{re}{sign}{im}i")
}

fn write_matrix<T, F>(f: &mut fmt::Formatter<'_>, a: &DenseArray<T>, elem: F) -> fmt::Result
where
    F: Fn(&T) -> String,
{
    if a.ndims() > 2 {
        return write!(f, "<{} array>", a.dims());
    }
    let (rows, cols) = (a.rows(), a.cols());
    let data = a.as_slice();
    write!(f, "[")?;
    for r in 0..rows {
        for c in 0..cols {
            if c > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", elem(&data[r + c * rows]))?;
        }
        if r + 1 < rows {
            write!(f, "; ")?;
        }
    }
    write!(f, "]")
}

fn write_sparse<T, F>(f: &mut fmt::Formatter<'_>, s: &SparseArray<T>, elem: F) -> fmt::Result
where
    F: Fn(&T) -> String,
{
    write!(
        f,
        "Compressed Column Sparse (rows = {}, cols = {}, nnz = {})",
        s.rows(),
        s.cols(),
        s.nnz()
    )?;
    for (r, c, v) in s.iter() {
        write!(f, "\n  ({}, {}) -> {}", r + 1, c + 1, elem(v))?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = engine_config().output_precision;
        let num = |v: &f64| format_number(*v, p);
        let cplx = |z: &Complex64| format_complex(*z, p);
        match self {
            Value::Undefined => write!(f, "<undefined>"),
            Value::Null => write!(f, "[]"),
            Value::MagicColon => write!(f, ":"),
            Value::Double(x) => write!(f, "{}", num(x)),
            Value::DoubleMatrix(a) => write_matrix(f, a, num),
            Value::Single(x) => write!(f, "{}", format_number(f64::from(*x), p.min(8))),
            Value::SingleMatrix(a) => write_matrix(f, a, |v| format_number(f64::from(*v), p.min(8))),
            Value::Complex(z) => write!(f, "{}", cplx(z)),
            Value::ComplexMatrix(a) => write_matrix(f, a, cplx),
            Value::FloatComplex(z) => write!(
                f,
                "{}",
                format_complex(Complex64::new(z.re.into(), z.im.into()), p.min(8))
            ),
            Value::FloatComplexMatrix(a) => write_matrix(f, a, |z| {
                format_complex(Complex64::new(z.re.into(), z.im.into()), p.min(8))
            }),
            Value::Int(s) => write!(f, "{s}"),
            Value::IntMatrix(a) => with_int_array!(a, m => write_matrix(f, m, |v| v.to_string())),
            Value::Bool(b) => write!(f, "{}", u8::from(*b)),
            Value::BoolMatrix(a) => write_matrix(f, a, |b| u8::from(*b).to_string()),
            Value::Char(a) => {
                write!(f, "[")?;
                let (rows, cols) = (a.rows(), a.numel() / a.rows().max(1));
                let data = a.as_slice();
                for r in 0..rows {
                    if r > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "'")?;
                    for c in 0..cols {
                        let ch = data[r + c * rows];
                        if ch == '\'' {
                            write!(f, "''")?;
                        } else {
                            write!(f, "{ch}")?;
                        }
                    }
                    write!(f, "'")?;
                }
                write!(f, "]")
            }
            Value::Range(r) => write_matrix(f, r.materialize(), num),
            Value::Sparse(s) => write_sparse(f, s, num),
            Value::SparseComplex(s) => write_sparse(f, s, cplx),
            Value::SparseBool(s) => write_sparse(f, s, |b| u8::from(*b).to_string()),
            Value::Cell(c) => {
                if c.ndims() > 2 {
                    return write!(f, "{{<{} cell>}}", c.dims());
                }
                let (rows, cols) = (c.rows(), c.cols());
                let data = c.as_slice();
                write!(f, "{{")?;
                for r in 0..rows {
                    for col in 0..cols {
                        if col > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", data[r + col * rows])?;
                    }
                    if r + 1 < rows {
                        write!(f, "; ")?;
                    }
                }
                write!(f, "}}")
            }
            Value::Struct(s) => {
                write!(f, "struct(")?;
                for (i, (name, value)) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_g_switches_to_exponent() {
        assert_eq!(format_number(3.0, 5), "3");
        assert_eq!(format_number(-0.0, 5), "0");
        assert_eq!(format_number(0.5, 5), "0.5");
        assert_eq!(format_number(3.14159265, 5), "3.1416");
        assert_eq!(format_number(123456.0, 5), "1.2346e5");
        assert_eq!(format_number(1e-7, 5), "1e-7");
        assert_eq!(format_number(f64::NEG_INFINITY, 5), "-Inf");
    }

    #[test]
    fn matrices_print_row_by_row() {
        let v = Value::matrix(vec![1.0, 3.0, 2.0, 4.0], 2, 2).expect("2x2");
        assert_eq!(v.to_string(), "[1 2; 3 4]");
        assert_eq!(Value::str("it's").to_string(), "['it''s']");
        assert_eq!(Value::Complex(Complex64::new(1.0, -2.0)).to_string(), "1-2i");
    }
}

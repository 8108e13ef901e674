//! Save/load hooks through a JSON-encoding stream.

use std::collections::VecDeque;
use std::io;

use matval_value::matval_array::{DenseArray, Range, SparseArray};
use matval_value::*;

#[derive(Default)]
struct JsonStream {
    lines: VecDeque<String>,
}

impl SaveStream for JsonStream {
    fn format(&self) -> SaveFormat {
        SaveFormat::Text
    }

    fn write_value(&mut self, name: &str, value: &SavedValue) -> io::Result<()> {
        let line = serde_json::to_string(&(name, value)).map_err(io::Error::other)?;
        self.lines.push_back(line);
        Ok(())
    }
}

impl LoadStream for JsonStream {
    fn format(&self) -> SaveFormat {
        SaveFormat::Text
    }

    fn read_value(&mut self) -> io::Result<Option<(String, SavedValue)>> {
        match self.lines.pop_front() {
            Some(line) => serde_json::from_str(&line).map(Some).map_err(io::Error::other),
            None => Ok(None),
        }
    }
}

fn reload(v: &Value) -> Value {
    let mut stream = JsonStream::default();
    assert!(v.save("x", &mut stream), "save {}", v.type_name());
    let mut back = Value::Undefined;
    assert!(back.load(&mut stream), "load {}", v.type_name());
    back
}

#[test]
fn test_values_survive_json() {
    let mut fields = StructValue::new();
    fields.set("name", Value::str("probe"));
    fields.set("gain", Value::from(DenseArray::row(vec![3i16, -4])));
    let values = [
        Value::from(2.5),
        Value::matrix(vec![1.0, 2.0, 3.0, 4.0], 2, 2).expect("2x2"),
        Value::from(1.5f32),
        Value::Complex(num_complex::Complex64::new(0.0, 1.0)),
        Value::from(DenseArray::row(vec![i64::MIN, i64::MAX])),
        Value::BoolMatrix(DenseArray::row(vec![true, false])),
        Value::str("hello"),
        Value::Range(Range::new(1.0, 2.0, 9.0).expect("1:2:9")),
        Value::Sparse(
            SparseArray::from_dense(&DenseArray::from_vec(vec![0.0, 1.0, 2.0, 0.0], [2, 2]).expect("2x2"))
                .expect("sparse"),
        ),
        Value::cell(vec![Value::from(1.0), Value::str("a")], [1, 2]).expect("cell"),
        Value::from(fields),
        Value::Null,
    ];
    for v in &values {
        assert_eq!(&reload(v), v);
    }
}

#[test]
fn test_corrupt_records_leave_target_alone() {
    let mut stream = JsonStream::default();
    stream.lines.push_back("{\"not\": \"a record\"}".to_string());
    let mut v = Value::from(1.0);
    assert!(!v.load(&mut stream));
    assert_eq!(v, Value::from(1.0));
}

#[test]
fn test_saved_record_exposes_buffers() {
    let rec = SavedValue::capture(&Value::row(vec![1.0, 2.0])).expect("capture");
    assert_eq!(rec.type_name, "matrix");
    assert_eq!(rec.dims, vec![1, 2]);
    match &rec.payload {
        SavedPayload::Array(fa) => assert_eq!(fa.real, ForeignPlane::F64(vec![1.0, 2.0])),
        other => panic!("unexpected payload {other:?}"),
    }
}

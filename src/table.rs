use crate::value::Value;
use crate::{Float, Integer, Row};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::fmt;

/// 采集结果表：保持插入顺序的键值容器，含1起整数下标的数组部分。
///
/// collect默认冻结结果表；冻结后的写入属于使用错误，直接panic。
/// 键语义与源语言的表一致：nil键与NaN键非法，整数值浮点键归一化为整数键，
/// 写入nil值等价于删除对应键。
#[derive(Debug)]
pub struct Table {
    entries: Vec<(Value, Value)>,
    index: FxHashMap<Value, usize>,
    next_index: Integer, // 数组部分下一个下标（1起）
    frozen: bool,
}

impl Table {
    pub fn new() -> Table {
        Table { entries: Vec::new(), index: FxHashMap::default(), next_index: 1, frozen: false }
    }

    /// 追加到数组部分，下标自动递增；nil值不占据下标。
    pub fn push(&mut self, value: Value) {
        if self.frozen {
            panic!("attempt to modify a frozen table");
        }
        if value.is_nil() {
            return;
        }
        let key = Value::Int(self.next_index);
        self.next_index += 1;
        self.insert(key, value);
    }

    /// 写入键值，键重复时覆盖并保持首次插入的位置；写入nil值删除对应键。
    pub fn insert(&mut self, key: Value, value: Value) {
        if self.frozen {
            panic!("attempt to modify a frozen table");
        }
        if key.is_nil() {
            panic!("table index is nil");
        }
        if let Value::Float(f) = &key {
            if f.is_nan() {
                panic!("table index is NaN");
            }
        }
        let key = normalize_key(key);
        if value.is_nil() {
            if let Some(pos) = self.index.remove(&key) {
                self.entries.remove(pos);
                for p in self.index.values_mut() {
                    if *p > pos {
                        *p -= 1;
                    }
                }
            }
            return;
        }
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// 按元组宽度写入一次拉取的产出：宽度1追加数组部分；宽度≥2取末两个值为键值对。
    pub(crate) fn insert_row(&mut self, mut row: Row) {
        if row.len() >= 2 {
            let value = row.pop();
            let key = row.pop();
            if let (Some(key), Some(value)) = (key, value) {
                self.insert(key, value);
            }
        } else if let Some(value) = row.pop() {
            self.push(value);
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        let key = normalize_key(key.clone());
        self.index.get(&key).map(|&pos| &self.entries[pos].1)
    }

    /// 冻结结果表，此后任何写入都会panic。
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl Default for Table {
    fn default() -> Table {
        Table::new()
    }
}

// 相等性只比较内容，不比较冻结状态与内部索引
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Table {}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.entries.iter().map(|(key, value)| format!("{}: {}", key, value)).join(", "))
    }
}

impl IntoIterator for Table {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// 整数值浮点键归一化为整数键，与源语言的表键语义一致。
fn normalize_key(key: Value) -> Value {
    match key {
        Value::Float(f) if f.fract() == 0.0 && f >= Integer::MIN as Float && f <= Integer::MAX as Float => {
            Value::Int(f as Integer)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_array_indices() {
        let mut table = Table::new();
        table.push(Value::from("a"));
        table.push(Value::from("b"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&Value::Int(1)), Some(&Value::from("a")));
        assert_eq!(table.get(&Value::Int(2)), Some(&Value::from("b")));
    }

    #[test]
    fn test_push_skips_nil() {
        let mut table = Table::new();
        table.push(Value::Nil);
        table.push(Value::from(7));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&Value::Int(1)), Some(&Value::from(7)));
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut table = Table::new();
        table.insert(Value::from("k1"), Value::from(1));
        table.insert(Value::from("k2"), Value::from(2));
        table.insert(Value::from("k1"), Value::from(10));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&Value::from("k1")), Some(&Value::from(10)));
        assert_eq!(table.entries().next().map(|(key, _)| key.clone()), Some(Value::from("k1")));
    }

    #[test]
    fn test_insert_nil_removes() {
        let mut table = Table::new();
        table.insert(Value::from("k1"), Value::from(1));
        table.insert(Value::from("k2"), Value::from(2));
        table.insert(Value::from("k3"), Value::from(3));
        table.insert(Value::from("k2"), Value::Nil);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&Value::from("k2")), None);
        // 删除后其余键仍可命中
        assert_eq!(table.get(&Value::from("k3")), Some(&Value::from(3)));
    }

    #[test]
    fn test_float_key_normalized() {
        let mut table = Table::new();
        table.insert(Value::Float(1.0), Value::from("a"));
        assert_eq!(table.get(&Value::Int(1)), Some(&Value::from("a")));
        table.insert(Value::Float(1.5), Value::from("b"));
        assert_eq!(table.get(&Value::Float(1.5)), Some(&Value::from("b")));
        assert_eq!(table.len(), 2);
    }

    #[test]
    #[should_panic(expected = "attempt to modify a frozen table")]
    fn test_frozen_insert_panics() {
        let mut table = Table::new();
        table.insert(Value::from("k"), Value::from(1));
        table.freeze();
        table.insert(Value::from("k"), Value::from(2));
    }

    #[test]
    #[should_panic(expected = "attempt to modify a frozen table")]
    fn test_frozen_push_panics() {
        let mut table = Table::new();
        table.freeze();
        table.push(Value::from(1));
    }

    #[test]
    #[should_panic(expected = "table index is nil")]
    fn test_nil_key_panics() {
        let mut table = Table::new();
        table.insert(Value::Nil, Value::from(1));
    }

    #[test]
    #[should_panic(expected = "table index is NaN")]
    fn test_nan_key_panics() {
        let mut table = Table::new();
        table.insert(Value::Float(Float::NAN), Value::from(1));
    }

    #[test]
    fn test_insert_row_shapes() {
        let mut table = Table::new();
        table.insert_row(vec![Value::from("v")]);
        assert_eq!(table.get(&Value::Int(1)), Some(&Value::from("v")));

        let mut table = Table::new();
        table.insert_row(vec![Value::from("k"), Value::from("v")]);
        assert_eq!(table.get(&Value::from("k")), Some(&Value::from("v")));

        // 宽度3时丢弃计数，取末两个值为键值对
        let mut table = Table::new();
        table.insert_row(vec![Value::Int(1), Value::from("k"), Value::from("v")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&Value::from("k")), Some(&Value::from("v")));
    }

    #[test]
    fn test_display() {
        let mut table = Table::new();
        table.push(Value::from("a"));
        table.insert(Value::from("k"), Value::from(2));
        assert_eq!(table.to_string(), "{1: a, k: 2}");
    }
}

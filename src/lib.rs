//! 惰性迭代器库：对数组与字典的链式序列处理API。
//! 链式调用仅排队阶段，消费操作驱动整条流水线按需求值并支持短路。

use crate::source::{Source, range_source};

mod err;
mod iter;
mod source;
mod stage;
mod table;
mod value;

pub use crate::err::IterErr;
pub use crate::iter::Iter;
pub use crate::table::Table;
pub use crate::value::{Func, Value};

/// 整数类型
pub type Integer = i64;
/// 浮点类型
pub type Float = f64;
/// 一次拉取产出的值元组
pub type Row = Vec<Value>;
/// 链式调用结果
pub type IterRes = Result<Iter, IterErr>;

/// 从顺序集合构造流水线，每次拉取产出 [值]。
pub fn array<I, T>(values: I) -> Iter
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Iter::new(Source::Array(values.into_iter().map(Into::into).collect::<Vec<_>>().into_iter()))
}

/// 从关联集合构造流水线，每次拉取产出 [键, 值]，顺序为插入顺序。
pub fn dict<I, K, V>(entries: I) -> Iter
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Value>,
    V: Into<Value>,
{
    Iter::new(Source::Dict(
        entries.into_iter().map(|(key, value)| (key.into(), value.into())).collect::<Vec<_>>().into_iter(),
    ))
}

/// 以[start, end]范围内的整数为源构造流水线，两端包含。
/// 负步长逆序产出；范围为空（起始值大于结束值）时无数据产出。
pub fn range(start: Integer, end: Integer, step: Integer) -> Iter {
    Iter::new(Source::Range(range_source(start, end, step)))
}

use crate::value::{Func, Value};
use crate::{Integer, Row};

/// 已排队的流水线阶段。
///
/// 链式调用仅向阶段序列追加变体，绝不执行；全部求值发生在拉取过程中，
/// 阶段顺序即链式调用顺序，顺序有观察意义（例如enumerate与filter的先后）。
#[derive(Debug)]
pub(crate) enum Stage {
    /// map         对当前元组应用变换，以结果替换元组的值位（末位），
    ///             键位与计数位保持原样，结果无条件下传（nil同样作为值下传）。
    Map(Func),
    /// filter      对当前元组应用谓词，假值时丢弃当前元素并回到源重新拉取。
    Filter(Func),
    /// mapWhile    应用变换，结果为nil时整条流水线就此耗尽（粘性，不可复活）；
    ///             否则与map一样替换值位下传。
    MapWhile(Func),
    /// enumerate   在元组头部前置1起计数；计数归本阶段所有，
    ///             只有到达本阶段的元素才会递增计数。
    Enumerate { count: Integer },
    /// take        保留前n个到达本阶段的元素，配额用尽后流水线耗尽。
    Take { remaining: usize },
}

/// 单个元素经过一个阶段的结果。
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum StageOut {
    /// 通过，携带变换后的元组继续后续阶段
    Pass(Row),
    /// 丢弃当前元素，回到源重新拉取
    Skip,
    /// 流水线就此耗尽
    Halt,
}

impl Stage {
    /// 对到达本阶段的元组求值。
    pub(crate) fn apply(&mut self, mut row: Row) -> StageOut {
        match self {
            Stage::Map(func) => {
                let value = func.call(&row);
                if let Some(last) = row.last_mut() {
                    *last = value;
                }
                StageOut::Pass(row)
            }
            Stage::Filter(func) => {
                if func.call(&row).truthy() {
                    StageOut::Pass(row)
                } else {
                    StageOut::Skip
                }
            }
            Stage::MapWhile(func) => {
                let value = func.call(&row);
                if value.is_nil() {
                    return StageOut::Halt;
                }
                if let Some(last) = row.last_mut() {
                    *last = value;
                }
                StageOut::Pass(row)
            }
            Stage::Enumerate { count } => {
                *count += 1;
                row.insert(0, Value::Int(*count));
                StageOut::Pass(row)
            }
            Stage::Take { remaining } => {
                if *remaining == 0 {
                    StageOut::Halt
                } else {
                    *remaining -= 1;
                    StageOut::Pass(row)
                }
            }
        }
    }

    /// take配额是否已用尽；用于在拉取开始前短路，避免上游阶段做无用功。
    pub(crate) fn exhausted(&self) -> bool {
        matches!(self, Stage::Take { remaining: 0 })
    }
}

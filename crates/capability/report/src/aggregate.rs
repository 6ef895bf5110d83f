//! 占用区间聚合（纯函数）。

use domain::OccupancyStatus;
use park_storage::OccupancyEventRecord;

/// 聚合结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OccupancySummary {
    pub state_change_count: i64,
    pub occupied_ms: i64,
}

/// 对按 `(ts_ms, seq)` 升序排列的事件计算状态变更次数与累计占用时长。
///
/// - 相邻两条事件状态不同计一次变更
/// - 相邻两条事件中后一条为 Occupied 时，计入两者的时间差
///
/// 少于两条事件时结果为零。
pub fn aggregate(events: &[OccupancyEventRecord]) -> OccupancySummary {
    events
        .windows(2)
        .fold(OccupancySummary::default(), |mut summary, pair| {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.status != next.status {
                summary.state_change_count += 1;
            }
            if next.status == OccupancyStatus::Occupied {
                summary.occupied_ms += next.ts_ms - prev.ts_ms;
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(samples: &[(i64, OccupancyStatus)]) -> Vec<OccupancyEventRecord> {
        samples
            .iter()
            .enumerate()
            .map(|(index, (ts_ms, status))| OccupancyEventRecord {
                event_id: format!("e-{index}"),
                space_id: "space-1".to_string(),
                status: *status,
                ts_ms: *ts_ms,
                seq: index as i64 + 1,
            })
            .collect()
    }

    #[test]
    fn free_occupied_free_sequence() {
        let summary = aggregate(&events(&[
            (0, OccupancyStatus::Free),
            (10_000, OccupancyStatus::Occupied),
            (25_000, OccupancyStatus::Free),
        ]));
        assert_eq!(summary.state_change_count, 2);
        // 后一条为 occupied 的区间只有 [0, 10000]
        assert_eq!(summary.occupied_ms, 10_000);
    }

    #[test]
    fn later_sample_decides_attribution() {
        let summary = aggregate(&events(&[
            (0, OccupancyStatus::Occupied),
            (4_000, OccupancyStatus::Occupied),
            (9_000, OccupancyStatus::Occupied),
        ]));
        assert_eq!(summary.state_change_count, 0);
        assert_eq!(summary.occupied_ms, 9_000);
    }

    #[test]
    fn zero_or_one_event_is_empty() {
        assert_eq!(aggregate(&[]), OccupancySummary::default());
        assert_eq!(
            aggregate(&events(&[(5_000, OccupancyStatus::Occupied)])),
            OccupancySummary::default()
        );
    }

    #[test]
    fn unknown_counts_as_a_distinct_state() {
        let summary = aggregate(&events(&[
            (0, OccupancyStatus::Occupied),
            (1_000, OccupancyStatus::Unknown),
            (2_000, OccupancyStatus::Occupied),
        ]));
        assert_eq!(summary.state_change_count, 2);
        assert_eq!(summary.occupied_ms, 1_000);
    }

    #[test]
    fn same_timestamp_pairs_add_no_duration() {
        let summary = aggregate(&events(&[
            (1_000, OccupancyStatus::Free),
            (1_000, OccupancyStatus::Occupied),
        ]));
        assert_eq!(summary.state_change_count, 1);
        assert_eq!(summary.occupied_ms, 0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let input = events(&[
            (0, OccupancyStatus::Free),
            (3_000, OccupancyStatus::Occupied),
            (7_000, OccupancyStatus::Free),
            (8_000, OccupancyStatus::Occupied),
        ]);
        assert_eq!(aggregate(&input), aggregate(&input));
    }
}

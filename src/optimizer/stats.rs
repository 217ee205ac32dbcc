//! Head travel statistics for an ordered strike list.

use crate::config::MachineSettings;
use crate::model::{Point, PunchOp};
use serde::Serialize;

/// Summary of one ordered sheet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PathStats {
    pub strikes: usize,
    pub tool_changes: usize,
    /// Straight-line head travel from the home position through every strike.
    pub travel: f64,
    /// Rough cycle time: rapid travel plus hits at the machine's punch rate.
    pub seconds: f64,
}

/// Measure an ordered strike list against machine speeds.
///
/// Zero or negative speeds contribute no time.
pub fn path_stats(ops: &[PunchOp], machine: &MachineSettings) -> PathStats {
    let mut last = Point::new(machine.home_x, machine.home_y);
    let mut travel = 0.0;
    for op in ops {
        let next = Point::new(op.x, op.y);
        travel += last.distance(&next);
        last = next;
    }

    let mut seconds = 0.0;
    if machine.rapid_speed > 0.0 {
        seconds += travel / machine.rapid_speed * 60.0;
    }
    if machine.punch_rate > 0.0 {
        seconds += ops.len() as f64 / machine.punch_rate * 60.0;
    }

    PathStats {
        strikes: ops.len(),
        tool_changes: ops.iter().filter(|op| op.tool_change).count(),
        travel,
        seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(x: f64, y: f64, tool_change: bool) -> PunchOp {
        PunchOp {
            x,
            y,
            tool_change,
            ..Default::default()
        }
    }

    #[test]
    fn test_path_stats() {
        let machine = MachineSettings {
            home_x: 0.0,
            home_y: 0.0,
            rapid_speed: 6000.0,
            punch_rate: 60.0,
            ..Default::default()
        };
        let ops = vec![op(300.0, 400.0, true), op(300.0, 0.0, false), op(0.0, 0.0, true)];
        let stats = path_stats(&ops, &machine);
        assert_eq!(stats.strikes, 3);
        assert_eq!(stats.tool_changes, 2);
        assert!((stats.travel - 1200.0).abs() < 1e-9);
        // 1200 mm at 100 mm/s plus 3 hits at one per second
        assert!((stats.seconds - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_list_and_zero_speeds() {
        let machine = MachineSettings {
            rapid_speed: 0.0,
            punch_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(path_stats(&[], &MachineSettings::default()), PathStats::default());
        assert_eq!(path_stats(&[op(10.0, 0.0, true)], &machine).seconds, 0.0);
    }
}

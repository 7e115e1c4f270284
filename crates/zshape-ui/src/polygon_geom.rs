//! 多边形逐点构建
//!
//! 管理器持有两条折线：
//! - 已锁定的顶点 `locked_points`
//! - 从最后一个锁定点指向光标的引导线 `leader_points`（1~2段）
//!
//! 状态：空 -> 构建中 -> 完成。完成只是通知客户端，不清除几何；
//! 任何状态下都可以通过 `reset` 回到空状态。

use crate::error::AddPointError;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;
use zshape_core::line_chain::{LineChain, LineChainBase};
use zshape_core::math::{saturate, snapped_45, translate, wide_delta, Coord, Point2I, VectorExt};
use zshape_core::seg::Seg;

/// 引导线模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeaderMode {
    /// 直线连到光标
    #[default]
    Direct,
    /// 限制为水平/垂直/45°
    Deg45,
}

/// 构建配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonGeomConfig {
    pub leader_mode: LeaderMode,
    /// 是否允许轮廓自相交
    pub intersections_allowed: bool,
}

impl Default for PolygonGeomConfig {
    fn default() -> Self {
        Self {
            leader_mode: LeaderMode::Direct,
            intersections_allowed: true,
        }
    }
}

/// 构建状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonGeomState {
    /// 没有锁定点
    Empty,
    /// 至少有一个锁定点
    InProgress,
    /// 客户端已收到完成通知
    Finished,
}

impl PolygonGeomState {
    pub fn name(&self) -> &'static str {
        match self {
            PolygonGeomState::Empty => "Empty",
            PolygonGeomState::InProgress => "InProgress",
            PolygonGeomState::Finished => "Finished",
        }
    }
}

/// 管理器的使用方
///
/// 回调中只能读取几何，不能修改。
pub trait PolygonGeomClient {
    /// 添加第一个点之前调用，返回 `false` 拒绝开始
    fn on_first_point(&mut self, geom: &PolygonGeom) -> bool;

    /// 几何发生变化
    fn on_geometry_change(&mut self, geom: &PolygonGeom);

    /// 构建完成
    fn on_complete(&mut self, geom: &PolygonGeom);
}

/// 构建中的多边形几何
#[derive(Debug, Clone, Default)]
pub struct PolygonGeom {
    config: PolygonGeomConfig,
    locked_points: LineChain,
    leader_points: LineChain,
    /// 最近一次光标位置及其模式修饰，删除顶点后用于重算引导线
    cursor: Option<(Point2I, LeaderMode)>,
    /// 引导线是否经过45°捕捉
    leader_snapped: bool,
    finished: bool,
}

impl PolygonGeom {
    pub fn locked_points(&self) -> &LineChain {
        &self.locked_points
    }

    pub fn leader_points(&self) -> &LineChain {
        &self.leader_points
    }

    pub fn config(&self) -> &PolygonGeomConfig {
        &self.config
    }

    pub fn leader_mode(&self) -> LeaderMode {
        self.config.leader_mode
    }

    pub fn intersections_allowed(&self) -> bool {
        self.config.intersections_allowed
    }

    pub fn state(&self) -> PolygonGeomState {
        if self.finished {
            PolygonGeomState::Finished
        } else if self.is_polygon_in_progress() {
            PolygonGeomState::InProgress
        } else {
            PolygonGeomState::Empty
        }
    }

    pub fn is_polygon_in_progress(&self) -> bool {
        !self.locked_points.is_empty()
    }

    /// `pt` 是否与第一个锁定点重合（点击起点闭合轮廓）
    pub fn new_point_closes_outline(&self, pt: &Point2I) -> bool {
        self.locked_points.first_point() == Some(*pt)
    }

    /// 把锁定点（可选地加上引导线）视为闭合折线检查自相交
    ///
    /// 与第一个锁定点或前一个点重合的引导线点会被跳过。
    pub fn is_self_intersecting(&self, include_leader: bool) -> bool {
        let mut pts = self.locked_points.clone();

        if include_leader {
            for &p in self.leader_points.points() {
                if pts.first_point() != Some(p) && pts.last_point() != Some(p) {
                    pts.append(p);
                }
            }
        }

        pts.set_closed(true);
        pts.self_intersecting().is_some()
    }

    /// 重算引导线；没有锁定点时违反调用约定，返回 `false`
    fn update_leader_points(&mut self, end: Point2I, modifier: LeaderMode) -> bool {
        let Some(last) = self.locked_points.last_point() else {
            debug_assert!(false, "leader update requires at least one locked point");
            tracing::error!("leader update requested with no locked point");
            return false;
        };

        let deg45 = self.config.leader_mode == LeaderMode::Deg45 || modifier == LeaderMode::Deg45;

        self.leader_points = if deg45 {
            self.deg45_leader(last, end)
        } else {
            LineChain::from_segment(last, end)
        };
        self.leader_snapped = deg45;
        true
    }

    /// 下一个要锁定的点
    ///
    /// 引导线有折点时锁定折点；只有一段的45°引导线锁定捕捉后的终点；
    /// 其余情况锁定 `pt` 本身。
    fn lock_candidate(&self, pt: Point2I) -> Point2I {
        match self.leader_points.point_count() {
            n if n > 2 => self.leader_points.point(1),
            2 if self.leader_snapped => self.leader_points.point(1),
            _ => pt,
        }
    }

    fn clear_leader(&mut self) {
        self.leader_points.clear();
        self.leader_snapped = false;
    }

    /// 45°引导线：捕捉方向后，再尝试与经过第一个锁定点的 8 个方向求交，
    /// 取离光标最近的交点作为折点
    fn deg45_leader(&self, last: Point2I, end: Point2I) -> LineChain {
        let new_end = translate(&last, &snapped_45(saturate(&wide_delta(&end, &last))));
        let mut bend: Option<Point2I> = None;

        if self.locked_points.segment_count() > 0 {
            let first = Seg::new(last, new_end);
            let mut test_seg = self.locked_points.segment(0);
            let mut best_dist = Coord::MAX;

            for i in 0..8 {
                if i > 0 {
                    let v = wide_delta(&test_seg.b, &test_seg.a).rotated(FRAC_PI_4);
                    test_seg.b = translate(&test_seg.a, &v);
                }

                // 与最后一个锁定点重合的交点没有意义
                let Some(p) = first.intersect_lines(&test_seg).filter(|p| *p != last) else {
                    continue;
                };

                let dist = wide_delta(&end, &p).int_len();
                if bend.is_none() || dist < best_dist {
                    best_dist = dist;
                    bend = Some(p);
                }
            }
        }

        let mut leader = LineChain::from_segment(last, new_end);

        if let Some(pt) = bend {
            // 折点与捕捉方向共线时直接连到折点
            if Seg::new(last, new_end).collinear(&Seg::new(new_end, pt)) {
                leader = LineChain::from_segment(last, pt);
            } else {
                leader.append(pt);
            }
        }

        leader
    }
}

/// 多边形构建管理器
pub struct PolygonGeomManager {
    geom: PolygonGeom,
    client: Box<dyn PolygonGeomClient>,
}

impl PolygonGeomManager {
    pub fn new(client: Box<dyn PolygonGeomClient>) -> Self {
        Self::with_config(client, PolygonGeomConfig::default())
    }

    pub fn with_config(client: Box<dyn PolygonGeomClient>, config: PolygonGeomConfig) -> Self {
        Self {
            geom: PolygonGeom {
                config,
                ..PolygonGeom::default()
            },
            client,
        }
    }

    /// 只读几何
    pub fn geom(&self) -> &PolygonGeom {
        &self.geom
    }

    /// 锁定一个顶点
    ///
    /// 引导线有折点，或只有一段但经过45°捕捉时，锁定引导线的第二个点，
    /// 否则锁定 `pt`。锁定成功后清空引导线，等待下一次光标更新。
    pub fn add_point(&mut self, pt: Point2I) -> Result<(), AddPointError> {
        if !self.geom.is_polygon_in_progress() && !self.client.on_first_point(&self.geom) {
            tracing::debug!(x = pt.x, y = pt.y, "client declined first point");
            return Err(AddPointError::Vetoed);
        }

        let candidate = self.geom.lock_candidate(pt);
        self.geom.locked_points.append(candidate);

        if !self.geom.config.intersections_allowed && self.geom.is_self_intersecting(false) {
            self.geom.locked_points.pop();
            tracing::debug!(x = candidate.x, y = candidate.y, "point rejected: self-intersection");
            return Err(AddPointError::SelfIntersection(candidate));
        }

        tracing::trace!(
            x = candidate.x,
            y = candidate.y,
            count = self.geom.locked_points.point_count(),
            "point locked"
        );

        // 旧的引导线起点已经不是最后一个锁定点
        self.geom.clear_leader();
        self.client.on_geometry_change(&self.geom);
        Ok(())
    }

    /// 通知客户端构建完成
    pub fn set_finished(&mut self) {
        self.geom.finished = true;
        self.client.on_complete(&self.geom);
    }

    pub fn set_leader_mode(&mut self, mode: LeaderMode) {
        self.geom.config.leader_mode = mode;
    }

    pub fn allow_intersections(&mut self, allow: bool) {
        self.geom.config.intersections_allowed = allow;
    }

    /// 更新光标位置并重算引导线
    pub fn set_cursor_position(&mut self, pos: Point2I) {
        self.set_cursor_position_with(pos, LeaderMode::Direct);
    }

    /// 更新光标位置；`modifier` 为 `Deg45` 时本次强制45°捕捉
    pub fn set_cursor_position_with(&mut self, pos: Point2I, modifier: LeaderMode) {
        self.geom.cursor = Some((pos, modifier));

        if self.geom.update_leader_points(pos, modifier) {
            self.client.on_geometry_change(&self.geom);
        }
    }

    /// 删除最后一个锁定点，并以上次光标位置重算引导线
    pub fn delete_last_corner(&mut self) {
        self.geom.locked_points.pop();

        match self.geom.locked_points.last_point() {
            Some(last) => {
                let (pos, modifier) = self.geom.cursor.unwrap_or((last, LeaderMode::Direct));
                self.geom.update_leader_points(pos, modifier);
            }
            None => {
                self.geom.clear_leader();
                self.geom.cursor = None;
            }
        }

        self.client.on_geometry_change(&self.geom);
    }

    /// 清空所有点，回到空状态
    pub fn reset(&mut self) {
        self.geom.locked_points.clear();
        self.geom.clear_leader();
        self.geom.cursor = None;
        self.geom.finished = false;

        self.client.on_geometry_change(&self.geom);
    }

    pub fn locked_points(&self) -> &LineChain {
        self.geom.locked_points()
    }

    pub fn leader_points(&self) -> &LineChain {
        self.geom.leader_points()
    }

    pub fn leader_mode(&self) -> LeaderMode {
        self.geom.leader_mode()
    }

    pub fn state(&self) -> PolygonGeomState {
        self.geom.state()
    }

    pub fn is_polygon_in_progress(&self) -> bool {
        self.geom.is_polygon_in_progress()
    }

    pub fn new_point_closes_outline(&self, pt: &Point2I) -> bool {
        self.geom.new_point_closes_outline(pt)
    }

    pub fn is_self_intersecting(&self, include_leader: bool) -> bool {
        self.geom.is_self_intersecting(include_leader)
    }
}

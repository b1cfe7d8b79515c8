pub mod damage;
pub mod entity;
pub mod events;
pub mod math;
pub mod services;
pub mod time;
pub mod trail;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::cell::{Cell, RefCell};

    use glam::{Mat4, Vec3};

    use crate::entity::{HitTarget, PieceId, ShieldId, TeamId, UnitHit, UnitId};
    use crate::events::{BeamSegment, ExplosionParams};
    use crate::services::{
        BeamSegmentEmitter, CollisionFlags, ExplosionResolver, PieceKinematics, RayTraceService,
        ShieldIntercept, ShieldInterceptRegistry, ShotInfo, TeamRelations, TeamResourcePool,
        TraceHit,
    };

    /// A unit hit on `team` with a 10-unit radius and no piece information.
    pub fn unit_hit(id: UnitId, team: TeamId) -> HitTarget {
        HitTarget::Unit(UnitHit {
            id,
            team,
            radius: 10.0,
            piece: None,
        })
    }

    /// One recorded trace query: (origin, dir, max_dist).
    pub type TraceQuery = (Vec3, Vec3, f32);

    /// Tracer that replays a fixed list of hits, one per call.
    ///
    /// Once the script runs out every further call is a miss, as is any
    /// scripted hit lying beyond the queried maximum.
    #[derive(Debug, Default)]
    pub struct ScriptedTracer {
        script: Vec<TraceHit>,
        next: Cell<usize>,
        queries: RefCell<Vec<TraceQuery>>,
    }

    impl ScriptedTracer {
        pub fn new(script: Vec<TraceHit>) -> Self {
            Self {
                script,
                ..Self::default()
            }
        }

        /// Tracer that never hits anything.
        pub fn empty() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> usize {
            self.queries.borrow().len()
        }

        pub fn queries(&self) -> Vec<TraceQuery> {
            self.queries.borrow().clone()
        }
    }

    impl RayTraceService for ScriptedTracer {
        fn trace(
            &self,
            origin: Vec3,
            dir: Vec3,
            max_dist: f32,
            _flags: CollisionFlags,
            _exclude: UnitId,
        ) -> TraceHit {
            self.queries.borrow_mut().push((origin, dir, max_dist));
            let idx = self.next.get();
            self.next.set(idx + 1);
            match self.script.get(idx) {
                Some(hit) if hit.distance <= max_dist => *hit,
                _ => TraceHit::miss(max_dist),
            }
        }
    }

    /// A shield the scripted registry reports on one trace iteration.
    #[derive(Debug, Clone, Copy)]
    pub struct ScriptedShield {
        pub id: ShieldId,
        pub distance: f32,
        pub new_dir: Vec3,
        /// Whether the beam carries on after hitting this shield.
        pub pierced: bool,
    }

    /// Shield registry that replays one answer per query.
    #[derive(Debug, Default)]
    pub struct ScriptedShields {
        script: Vec<Option<ScriptedShield>>,
        next: Cell<usize>,
        /// Every `(shield, damage_mult)` notification received.
        pub intercepted: Vec<(ShieldId, f32)>,
    }

    impl ScriptedShields {
        pub fn new(script: Vec<Option<ScriptedShield>>) -> Self {
            Self {
                script,
                ..Self::default()
            }
        }

        /// Registry with no shields at all.
        pub fn none() -> Self {
            Self::default()
        }

        /// `count` piercable shields spaced `spacing` apart, each bending the beam to `dir`.
        pub fn piercable_chain(count: usize, spacing: f32, dir: Vec3) -> Self {
            Self::new(
                (0..count)
                    .map(|i| {
                        Some(ScriptedShield {
                            id: i as ShieldId + 1,
                            distance: spacing,
                            new_dir: dir,
                            pierced: true,
                        })
                    })
                    .collect(),
            )
        }

        fn lookup(&self, shield: ShieldId) -> Option<&ScriptedShield> {
            self.script.iter().flatten().find(|s| s.id == shield)
        }
    }

    impl ShieldInterceptRegistry for ScriptedShields {
        fn query(
            &self,
            _shot: &ShotInfo,
            _start: Vec3,
            _dir: Vec3,
            length: f32,
        ) -> Option<ShieldIntercept> {
            let idx = self.next.get();
            self.next.set(idx + 1);
            let shield = self.script.get(idx).copied().flatten()?;
            (shield.distance < length).then_some(ShieldIntercept {
                shield: shield.id,
                distance: shield.distance,
                new_dir: shield.new_dir,
            })
        }

        fn on_intercepted(&mut self, shield: ShieldId, _shot: &ShotInfo, damage_mult: f32) -> bool {
            self.intercepted.push((shield, damage_mult));
            self.lookup(shield).is_some_and(|s| s.pierced)
        }
    }

    /// Emitter that keeps every segment it receives.
    #[derive(Debug, Default)]
    pub struct RecordingEmitter {
        pub segments: Vec<BeamSegment>,
    }

    impl BeamSegmentEmitter for RecordingEmitter {
        fn emit(&mut self, segment: BeamSegment) {
            self.segments.push(segment);
        }
    }

    /// Explosion sink that keeps every explosion it receives.
    #[derive(Debug, Default)]
    pub struct RecordingExplosions {
        pub explosions: Vec<ExplosionParams>,
    }

    impl ExplosionResolver for RecordingExplosions {
        fn apply(&mut self, params: ExplosionParams) {
            self.explosions.push(params);
        }
    }

    /// Resource pool shared by every team.
    #[derive(Debug, Default)]
    pub struct FixedPool {
        pub energy: f32,
        pub metal: f32,
        /// Every `(team, energy, metal)` consumption.
        pub consumed: Vec<(TeamId, f32, f32)>,
    }

    impl FixedPool {
        pub fn new(energy: f32, metal: f32) -> Self {
            Self {
                energy,
                metal,
                consumed: Vec::new(),
            }
        }
    }

    impl TeamResourcePool for FixedPool {
        fn has_energy(&self, _team: TeamId, amount: f32) -> bool {
            self.energy >= amount
        }

        fn has_metal(&self, _team: TeamId, amount: f32) -> bool {
            self.metal >= amount
        }

        fn consume(&mut self, team: TeamId, energy: f32, metal: f32) {
            self.energy -= energy;
            self.metal -= metal;
            self.consumed.push((team, energy, metal));
        }
    }

    /// Teams are allied with themselves and with every listed partner.
    #[derive(Debug, Default)]
    pub struct AllianceTable {
        pub pairs: Vec<(TeamId, TeamId)>,
    }

    impl TeamRelations for AllianceTable {
        fn allied(&self, a: TeamId, b: TeamId) -> bool {
            a == b
                || self
                    .pairs
                    .iter()
                    .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
        }
    }

    /// Every unit reports piece 0 with the same matrix.
    #[derive(Debug)]
    pub struct FixedPieces {
        pub matrix: Mat4,
    }

    impl Default for FixedPieces {
        fn default() -> Self {
            Self {
                matrix: Mat4::IDENTITY,
            }
        }
    }

    impl PieceKinematics for FixedPieces {
        fn weapon_piece(&self, _unit: UnitId, _weapon_num: usize) -> Option<PieceId> {
            Some(0)
        }

        fn piece_matrix(&self, _unit: UnitId, _piece: PieceId) -> Mat4 {
            self.matrix
        }
    }
}

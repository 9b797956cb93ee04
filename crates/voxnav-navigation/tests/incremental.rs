//! Cross-engine checks on randomized maps: LPA* repairs must agree with a
//! fresh A* search after every sensor update.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use voxnav_navigation::grid::Subscript;
use voxnav_navigation::search::{AStar, INFINITE_COST, LpaStar};
use voxnav_navigation::{Connectivity, MapParams, NavigationError, Point, Vehicle, VoxelMap};

const EPSILON: f64 = 1e-6;

fn params(connectivity: Connectivity) -> MapParams {
    MapParams {
        bounds: Vector3::new(12.0, 12.0, 3.0),
        dims: Subscript::new(12, 12, 3),
        vehicle: Vehicle {
            radius: 0.4,
            height: 0.4,
        },
        connectivity,
    }
}

fn random_cloud(rng: &mut StdRng, count: usize, keep_clear: &[Point]) -> Vec<Point> {
    (0..count)
        .map(|_| {
            Point::new(
                rng.random_range(0.0..12.0),
                rng.random_range(0.0..12.0),
                rng.random_range(0.0..3.0),
            )
        })
        .filter(|p| keep_clear.iter().all(|c| c.dist(p) > 1.0))
        .collect()
}

/// Cost of a path summed from the map's edge weights.
fn walk_cost(map: &VoxelMap, path: &[usize]) -> f64 {
    path.windows(2)
        .map(|pair| {
            map.edges(pair[0])
                .iter()
                .find(|e| e.target == pair[1])
                .map(|e| e.weight)
                .unwrap_or(INFINITE_COST)
        })
        .sum()
}

#[test]
fn test_lpa_repairs_match_astar() {
    let start_point = Point::new(0.5, 0.5, 0.5);
    let goal_point = Point::new(11.5, 11.5, 2.5);

    for (seed, connectivity) in [
        (1, Connectivity::Six),
        (2, Connectivity::Ten),
        (3, Connectivity::Eighteen),
        (4, Connectivity::TwentySix),
    ] {
        let mut rng = StdRng::seed_from_u64(seed);
        let obstacles = random_cloud(&mut rng, 40, &[start_point, goal_point]);
        let mut map = VoxelMap::new(&params(connectivity), &obstacles).unwrap();
        let start = map.point_to_index(&start_point).unwrap();
        let goal = map.point_to_index(&goal_point).unwrap();

        let mut lpa = LpaStar::new(&map);
        lpa.set_start(&map, start).unwrap();
        lpa.set_target(&map, goal).unwrap();
        let mut astar = AStar::new(&map);
        astar.set_target(&map, goal).unwrap();

        for round in 0..8 {
            lpa.compute_shortest_path(&map).unwrap();
            let full = astar.search(&map, start);
            let incremental = lpa.path(&map);
            match (&full, &incremental) {
                (Ok(full), Ok(incremental)) => {
                    assert!(
                        (full.cost - incremental.cost).abs() < EPSILON,
                        "{:?} round {}: A* {} vs LPA* {}",
                        connectivity,
                        round,
                        full.cost,
                        incremental.cost
                    );
                    assert_eq!(incremental.path.first(), Some(&start));
                    assert_eq!(incremental.path.last(), Some(&goal));
                    assert!(incremental.path.iter().all(|&c| map.is_traversable(c)));
                    assert!((walk_cost(&map, &incremental.path) - incremental.cost).abs() < EPSILON);
                }
                (Err(NavigationError::NoPath { .. }), Err(NavigationError::NoPath { .. })) => break,
                other => panic!("{:?} round {}: engines disagree: {:?}", connectivity, round, other),
            }

            let changed = map.sensor_update(&random_cloud(&mut rng, 25, &[start_point, goal_point]));
            lpa.notify_changed(&map, &changed).unwrap();
            astar.invalidate(&changed);
        }
    }
}

#[test]
fn test_sensor_updates_only_accrete() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut map = VoxelMap::new(&params(Connectivity::Six), &[]).unwrap();

    for _ in 0..10 {
        let before: Vec<bool> = map.cells().iter().map(|c| c.free).collect();
        let changed = map.sensor_update(&random_cloud(&mut rng, 15, &[]));

        assert!(changed.windows(2).all(|w| w[0] < w[1]));
        for (index, was_free) in before.iter().enumerate() {
            let is_free = map.cells()[index].free;
            assert!(*was_free || !is_free, "cell {} was freed", index);
            assert_eq!(changed.binary_search(&index).is_ok(), *was_free && !is_free);
        }
        // edges never change after the map is built
        assert!(map.cells().iter().all(|c| c.edges.iter().all(|e| e.weight > 0.0)));
    }
}

#[test]
fn test_sealed_goal_reports_no_path() {
    let mut map = VoxelMap::new(&params(Connectivity::TwentySix), &[]).unwrap();
    let start = map.point_to_index(&Point::new(0.5, 0.5, 0.5)).unwrap();
    let goal = map.point_to_index(&Point::new(6.5, 6.5, 1.5)).unwrap();

    let mut lpa = LpaStar::new(&map);
    lpa.set_start(&map, start).unwrap();
    lpa.set_target(&map, goal).unwrap();
    lpa.compute_shortest_path(&map).unwrap();
    assert!(lpa.path(&map).is_ok());

    // every cell in the 3x3x3 box around the goal except the goal itself
    let shell: Vec<Point> = (5..8)
        .flat_map(|x| (5..8).flat_map(move |y| (0..3).map(move |z| (x, y, z))))
        .filter(|&cell| cell != (6, 6, 1))
        .map(|(x, y, z)| Point::new(x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5))
        .collect();
    let changed = map.sensor_update(&shell);
    assert_eq!(changed.len(), 26);

    lpa.notify_changed(&map, &changed).unwrap();
    lpa.compute_shortest_path(&map).unwrap();
    assert!(matches!(lpa.path(&map), Err(NavigationError::NoPath { .. })));
    assert_eq!(lpa.g(goal), INFINITE_COST);

    let mut astar = AStar::new(&map);
    astar.set_target(&map, goal).unwrap();
    assert!(matches!(
        astar.search(&map, start),
        Err(NavigationError::NoPath { .. })
    ));
}

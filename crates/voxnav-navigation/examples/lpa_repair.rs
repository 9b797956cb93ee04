use nalgebra::Vector3;
use rand::Rng;
use voxnav_navigation::grid::Subscript;
use voxnav_navigation::search::{AStar, LpaStar, locate};
use voxnav_navigation::{Connectivity, MapParams, Point, Vehicle, VoxelMap};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let params = MapParams {
        bounds: Vector3::new(20.0, 20.0, 4.0),
        dims: Subscript::new(20, 20, 4),
        vehicle: Vehicle {
            radius: 0.4,
            height: 0.4,
        },
        connectivity: Connectivity::TwentySix,
    };
    let mut map = VoxelMap::new(&params, &[])?;

    let start = locate(&map, &Point::new(0.5, 0.5, 0.5))?;
    let goal = locate(&map, &Point::new(19.5, 19.5, 3.5))?;

    let mut lpa = LpaStar::new(&map);
    lpa.set_start(&map, start)?;
    lpa.set_target(&map, goal)?;
    let expanded = lpa.compute_shortest_path(&map)?;
    println!("Initial plan: {} ({} expansions)", lpa.path(&map)?, expanded);

    let mut astar = AStar::new(&map);
    astar.set_target(&map, goal)?;

    let mut rng = rand::rng();
    let batches = 10;
    let points_per_batch = 40;

    println!("Applying {} random sensor batches...", batches);
    for batch in 0..batches {
        let points: Vec<Point> = (0..points_per_batch)
            .map(|_| {
                Point::new(
                    rng.random_range(0.0..20.0),
                    rng.random_range(0.0..20.0),
                    rng.random_range(0.0..4.0),
                )
            })
            .filter(|p| {
                // keep the endpoints open
                map.point_to_index(p)
                    .is_some_and(|i| i != start && i != goal)
            })
            .collect();

        let changed = map.sensor_update(&points);
        lpa.notify_changed(&map, &changed)?;
        astar.invalidate(&changed);

        let expanded = lpa.compute_shortest_path(&map)?;
        match (lpa.path(&map), astar.search(&map, start)) {
            (Ok(incremental), Ok(full)) => println!(
                "Batch {}: {} cells changed, repair expanded {} vs {} for a full search, costs {:.3} / {:.3}",
                batch,
                changed.len(),
                expanded,
                full.nodes_explored,
                incremental.cost,
                full.cost
            ),
            (Err(e), _) | (_, Err(e)) => {
                println!("Batch {}: {}", batch, e);
                break;
            }
        }
    }

    Ok(())
}

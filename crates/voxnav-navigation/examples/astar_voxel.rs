use nalgebra::Vector3;
use std::collections::HashSet;
use voxnav_navigation::grid::Subscript;
use voxnav_navigation::search::{AStar, locate};
use voxnav_navigation::{Connectivity, MapParams, Point, Vehicle, VoxelMap};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A 10x10x1 map of 1m cells
    let params = MapParams {
        bounds: Vector3::new(10.0, 10.0, 1.0),
        dims: Subscript::new(10, 10, 1),
        vehicle: Vehicle {
            radius: 0.4,
            height: 0.4,
        },
        connectivity: Connectivity::Ten,
    };

    let obstacles: Vec<Point> = [
        (1, 1), (2, 1), (7, 1), (8, 1),
        (4, 2),
        (2, 3), (3, 3), (4, 3), (5, 3), (7, 3),
        (5, 4), (7, 4),
        (1, 5), (2, 5), (3, 5), (5, 5), (7, 5), (8, 5),
        (3, 6),
        (1, 7), (3, 7), (5, 7), (6, 7), (7, 7),
        (1, 8), (8, 8),
        (3, 9), (4, 9), (5, 9),
    ]
    .iter()
    .map(|&(x, y)| Point::new(x as f64 + 0.5, y as f64 + 0.5, 0.5))
    .collect();

    let map = VoxelMap::new(&params, &obstacles)?;
    println!("{}", map);

    let start = locate(&map, &Point::new(0.5, 0.5, 0.5))?;
    let goal = locate(&map, &Point::new(9.5, 9.5, 0.5))?;

    let mut astar = AStar::new(&map);
    astar.set_target(&map, goal)?;
    match astar.search(&map, start) {
        Ok(result) => {
            println!("{}", result);
            let path: HashSet<usize> = result.path.iter().copied().collect();
            print_layer(&map, start, goal, &path);
            for waypoint in result.waypoints(&map) {
                println!("  {}", waypoint);
            }
        }
        Err(e) => println!("No path found: {}", e),
    }

    Ok(())
}

fn print_layer(map: &VoxelMap, start: usize, goal: usize, path: &HashSet<usize>) {
    let dims = map.shape().dims();

    // Print from top to bottom (reverse y order for visual clarity)
    for y in (0..dims[1]).rev() {
        print!("{} ", y);
        for x in 0..dims[0] {
            let Some(index) = map.shape().subscript_to_index(&Subscript::new(x, y, 0)) else {
                continue;
            };
            let symbol = if index == start {
                'S'
            } else if index == goal {
                'G'
            } else if path.contains(&index) {
                '*'
            } else if map.is_traversable(index) {
                '.'
            } else {
                'X'
            };
            print!("{} ", symbol);
        }
        println!();
    }

    print!("  ");
    for x in 0..dims[0] {
        print!("{} ", x);
    }
    println!();
}

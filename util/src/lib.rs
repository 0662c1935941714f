/// Poor man's approx assertion for slices
#[macro_export]
macro_rules! assert_approx_slice_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let x: &[f64] = &$x;
        let y: &[f64] = &$y;
        assert_eq!(x.len(), y.len(), "slices have different lengths");

        let max_absdiff = x
            .iter()
            .zip(y)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {:?}", x);
            println!("right: {:?}", y);
            println!("max diff: {:e}", max_absdiff);
        }
        assert!(approx_eq);
    }};
}

/// Element offsets for a uniform 1D mesh with `nodes_per_element` nodes per element,
/// where neighboring elements share their end nodes.
pub fn interval_offsets(num_elements: usize, nodes_per_element: usize) -> Vec<usize> {
    assert!(nodes_per_element >= 2, "elements need at least two nodes");
    let mut offsets = Vec::with_capacity(num_elements * nodes_per_element);
    for i in 0..num_elements {
        for j in 0..nodes_per_element {
            offsets.push(i * (nodes_per_element - 1) + j);
        }
    }
    offsets
}

/// Number of distinct nodes in the mesh described by [`interval_offsets`].
pub fn interval_num_nodes(num_elements: usize, nodes_per_element: usize) -> usize {
    num_elements * (nodes_per_element - 1) + 1
}

/// Uniformly spaced vertex coordinates for the interval `[0, length]`.
pub fn interval_vertices(num_elements: usize, length: f64) -> Vec<f64> {
    (0..=num_elements)
        .map(|i| length * i as f64 / num_elements as f64)
        .collect()
}

/// Element offsets for a uniform tensor-product box mesh in `cells.len()` dimensions.
///
/// Each element has `nodes_per_dim^dim` nodes ordered with the x index fastest, and nodes
/// are shared between neighboring elements. Returns the offsets and the number of nodes.
pub fn box_offsets(cells: &[usize], nodes_per_dim: usize) -> (Vec<usize>, usize) {
    assert!(nodes_per_dim >= 2, "elements need at least two nodes per dimension");
    let dim = cells.len();
    let p = nodes_per_dim - 1;
    let nodes_along: Vec<usize> = cells.iter().map(|c| c * p + 1).collect();
    let num_nodes = nodes_along.iter().product();
    let num_elements: usize = cells.iter().product();
    let element_size = nodes_per_dim.pow(dim as u32);

    let mut offsets = Vec::with_capacity(num_elements * element_size);
    for e in 0..num_elements {
        // Element multi-index, x fastest
        let mut rest = e;
        let element_index: Vec<usize> = cells
            .iter()
            .map(|c| {
                let i = rest % c;
                rest /= c;
                i
            })
            .collect();

        for local in 0..element_size {
            let mut rest = local;
            let mut global = 0;
            let mut stride = 1;
            for d in 0..dim {
                let i = rest % nodes_per_dim;
                rest /= nodes_per_dim;
                global += (element_index[d] * p + i) * stride;
                stride *= nodes_along[d];
            }
            offsets.push(global);
        }
    }
    (offsets, num_nodes)
}

/// Vertex coordinates for the box `[0, lengths[0]] x ... ` matching [`box_offsets`] with two
/// nodes per dimension.
///
/// Coordinates are stored component by component: component `d` of vertex `i` is found
/// at `d * num_vertices + i`.
pub fn box_vertices(cells: &[usize], lengths: &[f64]) -> Vec<f64> {
    assert_eq!(cells.len(), lengths.len());
    let dim = cells.len();
    let vertices_along: Vec<usize> = cells.iter().map(|c| c + 1).collect();
    let num_vertices: usize = vertices_along.iter().product();

    let mut coords = vec![0.0; dim * num_vertices];
    for v in 0..num_vertices {
        let mut rest = v;
        for d in 0..dim {
            let i = rest % vertices_along[d];
            rest /= vertices_along[d];
            coords[d * num_vertices + v] = lengths[d] * i as f64 / cells[d] as f64;
        }
    }
    coords
}

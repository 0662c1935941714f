use fenris_matfree::basis::Basis;
use fenris_matfree::opts::{BasisOpt, ElemRestrictionOpt, VectorOpt};
use fenris_matfree::{Context, ElemRestriction, Operator, QuadMode, Strides, Vector};
use util::{interval_num_nodes, interval_offsets, interval_vertices};


/// The serial and the parallel reference backends, so that every scenario runs on both.
fn contexts() -> Vec<Context> {
    ["/cpu/self/ref/serial", "/cpu/self/ref/parallel"]
        .into_iter()
        .map(|resource| Context::init(resource).unwrap())
        .collect()
}

/// Restrictions, bases and quadrature data of a uniform 1D mesh of `[0, length]`.
pub struct IntervalProblem {
    pub ctx: Context,
    pub num_elements: usize,
    pub num_nodes: usize,
    pub q: usize,
    pub rx: ElemRestriction,
    pub ru: ElemRestriction,
    pub rq: ElemRestriction,
    pub bx: Basis<f64>,
    pub bu: Basis<f64>,
    pub coordinates: Vector<'static, f64>,
}

impl IntervalProblem {
    pub fn new(ctx: &Context, num_elements: usize, p: usize, q: usize, length: f64) -> Self {
        let num_vertices = num_elements + 1;
        let num_nodes = interval_num_nodes(num_elements, p);
        let rx = ctx
            .elem_restriction(num_elements, 2, 1, 1, num_vertices, &interval_offsets(num_elements, 2))
            .unwrap();
        let ru = ctx
            .elem_restriction(num_elements, p, 1, 1, num_nodes, &interval_offsets(num_elements, p))
            .unwrap();
        let rq = ctx
            .strided_elem_restriction(num_elements, q, 1, num_elements * q, Strides::new(1, q, q))
            .unwrap();
        let bx = ctx.basis_tensor_h1_lagrange(1, 1, 2, q, QuadMode::Gauss).unwrap();
        let bu = ctx.basis_tensor_h1_lagrange(1, 1, p, q, QuadMode::Gauss).unwrap();
        let coordinates = ctx.vector_from_slice(&interval_vertices(num_elements, length));
        Self {
            ctx: *ctx,
            num_elements,
            num_nodes,
            q,
            rx,
            ru,
            rq,
            bx,
            bu,
            coordinates,
        }
    }

    /// Computes quadrature data with the given gallery kernel (`Mass1DBuild` or `Poisson1DBuild`).
    pub fn build_qdata(&self, name: &str) -> Vector<'static, f64> {
        let qf = self.ctx.q_function_by_name::<f64>(name).unwrap();
        let qdata = self.ctx.vector(self.num_elements * self.q);
        let setup = self
            .ctx
            .operator(&qf)
            .field("dx", &self.rx, &self.bx, VectorOpt::Active)
            .unwrap()
            .field("weights", ElemRestrictionOpt::None, &self.bx, VectorOpt::None)
            .unwrap()
            .field("qdata", &self.rq, BasisOpt::Collocated, VectorOpt::Active)
            .unwrap();
        setup.apply(&self.coordinates, &qdata).unwrap();
        qdata
    }

    /// An operator `v = A u` using the given gallery kernel on previously built quadrature data.
    pub fn operator(&self, name: &str, u: &str, v: &str, qdata: &Vector<'static, f64>) -> Operator<'static, f64> {
        let qf = self.ctx.q_function_by_name::<f64>(name).unwrap();
        self.ctx
            .operator(&qf)
            .field(u, &self.ru, &self.bu, VectorOpt::Active)
            .unwrap()
            .field("qdata", &self.rq, BasisOpt::Collocated, qdata)
            .unwrap()
            .field(v, &self.ru, &self.bu, VectorOpt::Active)
            .unwrap()
    }

    pub fn mass_operator(&self, qdata: &Vector<'static, f64>) -> Operator<'static, f64> {
        self.operator("MassApply", "u", "v", qdata)
    }
}

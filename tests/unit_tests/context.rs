use fenris_matfree::{Backend, Context, Error, ExecutionOptions, QuadMode, Strides};

#[test]
fn init_selects_backend_from_resource() {
    for resource in ["/cpu/self", "/cpu/self/ref", "/cpu/self/ref/serial", "/cpu/self/ref/"] {
        let ctx = Context::init(resource).unwrap();
        assert_eq!(ctx.options().backend, Backend::Serial);
    }
    let ctx = Context::init("/cpu/self/ref/parallel").unwrap();
    assert_eq!(ctx.options().backend, Backend::Parallel);
    assert_eq!(ctx.options().min_elements_per_task, 64);
}

#[test]
fn unknown_resource_is_unsupported() {
    let result = Context::init("/gpu/cuda");
    assert!(matches!(result, Err(Error::UnsupportedBackend { resource }) if resource == "/gpu/cuda"));
}

#[test]
fn execution_options_roundtrip_through_json() {
    let options = ExecutionOptions {
        backend: Backend::Parallel,
        min_elements_per_task: 8,
    };
    let json = serde_json::to_string(&options).unwrap();
    let deserialized: ExecutionOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, options);
}

#[test]
fn missing_options_take_defaults() {
    let options: ExecutionOptions = serde_json::from_str(r#"{ "backend": "Parallel" }"#).unwrap();
    assert_eq!(options.backend, Backend::Parallel);
    assert_eq!(options.min_elements_per_task, ExecutionOptions::default().min_elements_per_task);

    let options: ExecutionOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, ExecutionOptions::default());
}

#[test]
fn objects_created_through_context() {
    let ctx = Context::default();
    let v = ctx.vector::<f64>(3);
    assert_eq!(v.len(), 3);
    let w = ctx.vector_from_slice(&[1.0, 2.0]);
    assert_eq!(w.to_vec().unwrap(), vec![1.0, 2.0]);

    let r = ctx.elem_restriction(1, 2, 1, 1, 2, &[0, 1]).unwrap();
    assert_eq!(r.evector_size(), 2);
    let s = ctx
        .strided_elem_restriction(2, 3, 1, 6, Strides::backend(3, 1))
        .unwrap();
    assert!(s.is_strided());

    let b = ctx
        .basis_tensor_h1_lagrange::<f64>(1, 1, 2, 3, QuadMode::Gauss)
        .unwrap();
    assert_eq!(b.num_quadrature_points(), 3);

    let qf = ctx.q_function_by_name::<f64>("MassApply").unwrap();
    assert_eq!(qf.name(), Some("MassApply"));

    let options = ExecutionOptions {
        backend: Backend::Parallel,
        min_elements_per_task: 1,
    };
    let op = Context::from_options(options).operator(&qf);
    assert_eq!(op.options(), &options);
    assert!(ctx.composite_operator::<f64>().is_empty());
}

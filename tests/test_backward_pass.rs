// Backward-pass contracts of the layer stack: shapes, cache state and a
// hand-derived single training step.

use approx::assert_relative_eq;
use ndarray::array;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use probe_nn::{Layer, Linear, LossType, MemorySink, Network, NetworkSpec, NnError, Param, Step, Trace};

fn fixed_network() -> Network {
    let mut network = Network::new(0.1);
    network.add_layer(Layer::Linear(
        Linear::from_params(
            "L0_LIN",
            array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 0.0]],
            array![[0.0, 0.0, 0.0]],
        )
        .unwrap(),
    ));
    network.add_layer(Layer::relu("L0_RELU"));
    network.add_layer(Layer::Linear(
        Linear::from_params("L1_LIN", array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]], array![[0.0, 0.0]]).unwrap(),
    ));
    network.set_loss(LossType::SoftmaxCrossEntropy);
    network
}

#[test]
fn linear_shapes_follow_batch_and_widths() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut layer = Linear::new("L", 5, 3, &mut rng);
    let x = probe_nn::math::matrix::he(4, 5, 5, &mut rng);

    let y = layer.forward(&x, true, &mut Trace::off()).unwrap();
    assert_eq!(y.dim(), (4, 3));

    let (dx, grads) = layer.backward(&y, &mut Trace::off()).unwrap();
    assert_eq!(dx.dim(), (4, 5));
    assert_eq!(grads.len(), 2);
    assert_eq!(grads[0].param, Param::Weights);
    assert_eq!(grads[0].grad.dim(), (5, 3));
    assert_eq!(grads[1].param, Param::Biases);
    assert_eq!(grads[1].grad.dim(), (1, 3));
}

#[test]
fn backward_before_training_forward_is_stale() {
    let mut network = NetworkSpec::reference_mlp(4, 2, 0.1, 0).build().unwrap();
    for layer in &mut network.layers {
        let width = match layer {
            Layer::Linear(l) => l.output_size(),
            Layer::Relu(_) => 256,
        };
        let err = layer.backward(&ndarray::Array2::zeros((1, width)), &mut Trace::off()).unwrap_err();
        assert!(matches!(err, NnError::StaleGradientState { .. }), "{}", layer.name());
    }
}

#[test]
fn prediction_in_eval_mode_invalidates_caches() {
    let mut network = fixed_network();
    let x = array![[1.0, 0.0, 0.0, 0.0]];
    network.predict(&x, true).unwrap();
    network.predict(&x, false).unwrap();
    let err = network.layers[2].backward(&array![[0.5, -0.5]], &mut Trace::off()).unwrap_err();
    assert!(matches!(err, NnError::StaleGradientState { .. }));
}

#[test]
fn train_without_loss_is_rejected() {
    let mut network = Network::new(0.1);
    network.add_layer(Layer::relu("R"));
    let err = network.train(&array![[1.0]], &[0]).unwrap_err();
    assert!(matches!(err, NnError::LossNotConfigured));
}

#[test]
fn single_step_matches_hand_derivation() {
    let mut network = fixed_network();
    let x = array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
    let labels = [0, 1];

    // Scores are [[1, 0], [0, 1]], so both rows have p(true) = e / (e + 1).
    let expected_loss = (1.0 + (-1.0f64).exp()).ln();
    // (1 - p(true)) / batch
    let a = (1.0 - 1.0 / (1.0 + (-1.0f64).exp())) / 2.0;

    let loss = network.train(&x, &labels).unwrap();
    assert_relative_eq!(loss, expected_loss, epsilon = 1e-12);

    let Layer::Linear(l1) = &network.layers[2] else { panic!("expected linear") };
    let expected_w1 = array![[1.0 + 0.1 * a, -0.1 * a], [-0.1 * a, 1.0 + 0.1 * a], [0.0, 0.0]];
    for (got, want) in l1.weights.iter().zip(expected_w1.iter()) {
        assert_relative_eq!(*got, *want, epsilon = 1e-12);
    }
    for b in l1.biases.iter() {
        assert_relative_eq!(*b, 0.0, epsilon = 1e-15);
    }

    // The zero pre-activations still pass gradient (sub-gradient 1 at 0).
    let Layer::Linear(l0) = &network.layers[0] else { panic!("expected linear") };
    let expected_w0 = array![
        [1.0 + 0.1 * a, -0.1 * a, 0.0],
        [-0.1 * a, 1.0 + 0.1 * a, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0]
    ];
    for (got, want) in l0.weights.iter().zip(expected_w0.iter()) {
        assert_relative_eq!(*got, *want, epsilon = 1e-12);
    }
}

#[test]
fn seeded_step_is_reproducible_and_moves_by_lr_times_grad() {
    let spec = NetworkSpec {
        learning_rate: 0.1,
        momentum: 0.0,
        seed: 42,
        layers: vec![
            probe_nn::LayerSpec::Linear { name: "L0_LIN".to_string(), input_size: 4, output_size: 3 },
            probe_nn::LayerSpec::Relu { name: "L0_RELU".to_string() },
            probe_nn::LayerSpec::Linear { name: "L1_LIN".to_string(), input_size: 3, output_size: 2 },
        ],
        loss: LossType::SoftmaxCrossEntropy,
    };
    let x = array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
    let labels = [0, 1];

    let mut first = spec.build().unwrap();
    let mut second = spec.build().unwrap();
    let before = first.clone();

    let mut sink = MemorySink::default();
    let loss_a = first.train_traced(&x, &labels, &mut Trace::new(Step::new(0, 0), &mut sink)).unwrap();
    let loss_b = second.train(&x, &labels).unwrap();
    assert_eq!(loss_a, loss_b);

    for (idx, name, rows, cols) in [(0, "L0_LIN", 4, 3), (2, "L1_LIN", 3, 2)] {
        let (Layer::Linear(old), Layer::Linear(new), Layer::Linear(twin)) =
            (&before.layers[idx], &first.layers[idx], &second.layers[idx])
        else {
            panic!("expected linear layers");
        };
        assert_eq!(new.weights, twin.weights);

        // Dumped gradients are transposed: [out, in].
        let g_w = sink.get(&format!("epoch_000_iter_000_{name}_gW_{cols}x{rows}.txt")).unwrap();
        let g_b = sink.get(&format!("epoch_000_iter_000_{name}_gb_1x{cols}.txt")).unwrap();
        let delta_w = &new.weights - &old.weights;
        let delta_b = &new.biases - &old.biases;
        for (d, g) in delta_w.iter().zip(g_w.t().iter()) {
            assert_relative_eq!(*d, -0.1 * g, epsilon = 1e-12);
        }
        for (d, g) in delta_b.iter().zip(g_b.iter()) {
            assert_relative_eq!(*d, -0.1 * g, epsilon = 1e-12);
        }
    }

    let dumped_loss = sink.get("epoch_000_iter_000_COST_CE_loss_1x1.txt").unwrap();
    assert_eq!(dumped_loss[[0, 0]], loss_a);

    // Seed 42 expands to a fixed ChaCha8 stream, so these values only move
    // if initialization or the math changes.
    let (Layer::Linear(l0), Layer::Linear(l1)) = (&before.layers[0], &before.layers[2]) else {
        panic!("expected linear layers");
    };
    assert_relative_eq!(l0.weights[[0, 0]], 1.0184134259767024, epsilon = 1e-14);
    assert_relative_eq!(l0.weights[[0, 1]], -0.5202058976023719, epsilon = 1e-14);
    assert_relative_eq!(l0.weights[[3, 2]], 0.966363715622529, epsilon = 1e-14);
    assert_relative_eq!(l1.weights[[0, 0]], -0.016968334198850177, epsilon = 1e-14);
    assert_relative_eq!(l1.weights[[2, 1]], -0.46160092282282494, epsilon = 1e-14);

    assert_relative_eq!(loss_a, 0.7355180676933528, epsilon = 1e-12);

    let (Layer::Linear(l0_new), Layer::Linear(l1_new)) = (&first.layers[0], &first.layers[2]) else {
        panic!("expected linear layers");
    };
    let delta_l1 = &l1_new.weights - &l1.weights;
    let expected_l1 = array![
        [0.01877113484376876, -0.01877113484376877],
        [-0.002432363417135947, 0.002432363417135947],
        [-0.010944596881570505, 0.010944596881570502]
    ];
    for (got, want) in delta_l1.iter().zip(expected_l1.iter()) {
        assert_relative_eq!(*got, *want, epsilon = 1e-12);
    }
    let delta_l0 = &l0_new.weights - &l0.weights;
    assert_relative_eq!(delta_l0[[0, 0]], -0.0026233685446278815, epsilon = 1e-12);
    assert_relative_eq!(delta_l0[[1, 1]], 0.0417649325712455, epsilon = 1e-12);
    assert_relative_eq!(delta_l0[[1, 2]], -0.0158532995299919, epsilon = 1e-12);
    // Unit 1 is dead for the first sample and rows 2..4 never see input.
    assert_eq!(delta_l0[[0, 1]], 0.0);
    assert_eq!(delta_l0.row(3).sum(), 0.0);
}

#[test]
fn training_step_emits_every_linear_record() {
    let mut network = fixed_network();
    let mut sink = MemorySink::default();
    let x = array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
    network.train_traced(&x, &[0, 1], &mut Trace::new(Step::new(1, 7), &mut sink)).unwrap();

    let names: Vec<&str> = sink.names().collect();
    assert_eq!(
        names,
        [
            "epoch_001_iter_007_L0_LIN_out_2x3.txt",
            "epoch_001_iter_007_L0_LIN_W_3x4.txt",
            "epoch_001_iter_007_L0_LIN_b_1x3.txt",
            "epoch_001_iter_007_L1_LIN_out_2x2.txt",
            "epoch_001_iter_007_L1_LIN_W_2x3.txt",
            "epoch_001_iter_007_L1_LIN_b_1x2.txt",
            "epoch_001_iter_007_COST_CE_loss_1x1.txt",
            "epoch_001_iter_007_L1_LIN_delta_2x2.txt",
            "epoch_001_iter_007_L1_LIN_gW_2x3.txt",
            "epoch_001_iter_007_L1_LIN_gb_1x2.txt",
            "epoch_001_iter_007_L0_LIN_delta_2x3.txt",
            "epoch_001_iter_007_L0_LIN_gW_3x4.txt",
            "epoch_001_iter_007_L0_LIN_gb_1x3.txt",
        ]
    );
}

#[test]
fn eval_prediction_emits_nothing() {
    let mut network = fixed_network();
    let mut sink = MemorySink::default();
    network
        .predict_traced(&array![[1.0, 0.0, 0.0, 0.0]], false, &mut Trace::new(Step::default(), &mut sink))
        .unwrap();
    assert!(sink.is_empty());
}

//! Trainer tests

use super::*;
use crate::autograd::{ops, ArenaId, Context, Shape};
use crate::optim::{Adam, SGD};
use crate::Error;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn xor_trainer(activation: Activation) -> (Trainer, crate::Tensor, crate::Tensor) {
    let mut ctx = Context::new();
    let params = ctx.create_arena(1 << 20).unwrap();
    let scratch = ctx.create_arena(1 << 20).unwrap();
    let model = Mlp::xor(&mut ctx, params, activation).unwrap();
    let (x, y) = xor_dataset(&mut ctx, params).unwrap();
    let trainer = Trainer::new(
        ctx,
        params,
        scratch,
        model,
        Box::new(Adam::new(0.03, 0.0, 0.0)),
        Box::new(MSELoss),
        TrainConfig::default(),
    );
    (trainer, x, y)
}

#[test]
fn test_xor_dataset_layout() {
    let mut ctx = Context::new();
    let arena = ctx.create_arena(4096).unwrap();
    let (x, y) = xor_dataset(&mut ctx, arena).unwrap();

    assert_eq!(ctx.shape(x).unwrap(), Shape::new(4, 2));
    assert_eq!(ctx.data(y).unwrap(), &[0.0, 1.0, 1.0, 0.0]);
    assert!(!ctx.requires_grad(x).unwrap());
}

#[test]
fn test_xor_sigmoid_adam_learns() {
    let (mut trainer, x, y) = xor_trainer(Activation::Sigmoid);

    let result = trainer.train(x, y, 250).unwrap();
    assert_eq!(result.epochs, 250);
    assert_eq!(result.losses.len(), 250);
    assert!(result.final_loss < result.initial_loss / 2.0);
    assert_eq!(trainer.accuracy(x, y).unwrap(), 1.0);

    let predictions = trainer.predict(x).unwrap();
    let rounded: Vec<f32> = predictions.iter().map(|p| p.round()).collect();
    assert_eq!(rounded, vec![0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn test_step_arena_returns_to_mark() {
    let (mut trainer, x, y) = xor_trainer(Activation::Tanh);
    let scratch = trainer.step_arena();
    let used = trainer.ctx().arena(scratch).unwrap().used();
    let count = trainer.ctx().tensor_count(scratch).unwrap();

    for _ in 0..5 {
        trainer.train_step(x, y).unwrap();
        assert_eq!(trainer.ctx().arena(scratch).unwrap().used(), used);
        assert_eq!(trainer.ctx().tensor_count(scratch).unwrap(), count);
    }
    trainer.accuracy(x, y).unwrap();
    assert_eq!(trainer.ctx().arena(scratch).unwrap().used(), used);
}

#[test]
fn test_parameter_arena_is_stable_across_steps() {
    let (mut trainer, x, y) = xor_trainer(Activation::Relu);
    let params = trainer.params_arena();
    let used = trainer.ctx().arena(params).unwrap().used();

    trainer.train(x, y, 10).unwrap();
    assert_eq!(trainer.ctx().arena(params).unwrap().used(), used);
}

#[test]
fn test_train_step_updates_parameters() {
    let (mut trainer, x, y) = xor_trainer(Activation::Sigmoid);
    let w1 = trainer.model().w1;
    let before = trainer.ctx().data(w1).unwrap().to_vec();

    trainer.train_step(x, y).unwrap();
    assert_ne!(trainer.ctx().data(w1).unwrap(), before.as_slice());
}

#[test]
fn test_zero_epochs_rejected() {
    let (mut trainer, x, y) = xor_trainer(Activation::Sigmoid);
    assert!(matches!(
        trainer.train(x, y, 0),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn test_failed_step_still_rolls_back() {
    let (mut trainer, x, _) = xor_trainer(Activation::Sigmoid);
    let scratch = trainer.step_arena();
    let used = trainer.ctx().arena(scratch).unwrap().used();
    let params = trainer.params_arena();
    let wrong = ops::from_slice(trainer.ctx_mut(), params, Shape::new(1, 4), &[0.0; 4], false).unwrap();

    assert!(matches!(
        trainer.train_step(x, wrong),
        Err(Error::ShapeMismatch { .. })
    ));
    assert_eq!(trainer.ctx().arena(scratch).unwrap().used(), used);
    assert_eq!(trainer.ctx().arena(scratch).unwrap().checkpoint_depth(), 0);
}

fn classifier(ctx: &mut Context, params: ArenaId, seed: u64) -> Mlp {
    let mut rng = StdRng::seed_from_u64(seed);
    Mlp::new(ctx, params, 2, 8, 2, Activation::Tanh, &mut rng).unwrap()
}

#[test]
fn test_cross_entropy_classifier_improves() {
    let mut ctx = Context::new();
    let params = ctx.create_arena(1 << 20).unwrap();
    let scratch = ctx.create_arena(1 << 20).unwrap();
    let model = classifier(&mut ctx, params, 41423);
    let (x, y) = xor_dataset(&mut ctx, params).unwrap();

    let mut trainer = Trainer::new(
        ctx,
        params,
        scratch,
        model,
        Box::new(Adam::new(0.03, 0.0, 0.0)),
        Box::new(CrossEntropyLoss),
        TrainConfig::new().with_log_interval(0),
    );
    let result = trainer.train(x, y, 300).unwrap();
    assert!(result.final_loss < result.initial_loss);

    let accuracy = trainer.accuracy(x, y).unwrap();
    assert!((0.0..=1.0).contains(&accuracy));
    assert_eq!(trainer.predict(x).unwrap().dim(), (4, 2));
}

#[test]
fn test_sgd_trainer_lr_accessors() {
    let mut ctx = Context::new();
    let params = ctx.create_arena(1 << 20).unwrap();
    let scratch = ctx.create_arena(1 << 20).unwrap();
    let model = classifier(&mut ctx, params, 7);

    let mut trainer = Trainer::new(
        ctx,
        params,
        scratch,
        model,
        Box::new(SGD::new(0.1, 0.9)),
        Box::new(CrossEntropyLoss),
        TrainConfig::default(),
    );
    assert_eq!(trainer.lr(), 0.1);
    trainer.set_lr(0.01);
    assert_eq!(trainer.lr(), 0.01);
}

#[test]
fn test_batched_full_width_matches_full_batch() {
    let (mut trainer, x, y) = xor_trainer(Activation::Sigmoid);
    let mut loader = DataLoader::new(trainer.ctx(), x, y, 4).unwrap().with_shuffle(41423);

    let result = trainer.train_batched(&mut loader, 250).unwrap();
    assert_eq!(result.losses.len(), 250);
    assert!(result.final_loss < result.initial_loss / 2.0);
    assert_eq!(trainer.accuracy(x, y).unwrap(), 1.0);
}

#[test]
fn test_mini_batches_step_once_per_batch() {
    let (mut trainer, x, y) = xor_trainer(Activation::Tanh);
    let scratch = trainer.step_arena();
    let params = trainer.params_arena();
    let scratch_used = trainer.ctx().arena(scratch).unwrap().used();
    let params_used = trainer.ctx().arena(params).unwrap().used();
    let mut loader = DataLoader::new(trainer.ctx(), x, y, 2).unwrap().with_shuffle(9);
    assert_eq!(loader.num_batches(), 2);

    let w1 = trainer.model().w1;
    let before = trainer.ctx().data(w1).unwrap().to_vec();
    let loss = trainer.train_epoch(&mut loader).unwrap();
    assert!(loss.is_finite());
    assert_ne!(trainer.ctx().data(w1).unwrap(), before.as_slice());

    let result = trainer.train_batched(&mut loader, 200).unwrap();
    assert!(result.final_loss < result.initial_loss);
    assert_eq!(trainer.ctx().arena(scratch).unwrap().used(), scratch_used);
    assert_eq!(trainer.ctx().arena(scratch).unwrap().checkpoint_depth(), 0);
    assert_eq!(trainer.ctx().arena(params).unwrap().used(), params_used);
}

#[test]
fn test_failed_batch_still_rolls_back() {
    let (mut trainer, x, _) = xor_trainer(Activation::Sigmoid);
    let scratch = trainer.step_arena();
    let used = trainer.ctx().arena(scratch).unwrap().used();
    let params = trainer.params_arena();
    // right row count, wrong width for a single-output model
    let wide = ops::zeros(trainer.ctx_mut(), params, Shape::new(4, 2)).unwrap();
    let mut loader = DataLoader::new(trainer.ctx(), x, wide, 2).unwrap();

    assert!(matches!(
        trainer.train_batched(&mut loader, 3),
        Err(Error::ShapeMismatch { .. })
    ));
    assert_eq!(trainer.ctx().arena(scratch).unwrap().used(), used);
    assert_eq!(trainer.ctx().arena(scratch).unwrap().checkpoint_depth(), 0);
}

#[test]
fn test_split_rows_carves_a_holdout() {
    let mut ctx = Context::new();
    let arena = ctx.create_arena(4096).unwrap();
    let (x, y) = xor_dataset(&mut ctx, arena).unwrap();

    let tail_x = split_rows(&mut ctx, arena, x, 2, 2).unwrap();
    let tail_y = split_rows(&mut ctx, arena, y, 2, 2).unwrap();
    assert_eq!(ctx.data(tail_x).unwrap(), &[1.0, 0.0, 1.0, 1.0]);
    assert_eq!(ctx.data(tail_y).unwrap(), &[1.0, 0.0]);

    assert!(matches!(
        split_rows(&mut ctx, arena, x, 3, 2),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        split_rows(&mut ctx, arena, x, 0, 0),
        Err(Error::InvalidParameter(_))
    ));
}

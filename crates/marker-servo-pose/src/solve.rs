//! Numerical core: homography decomposition, orthogonal iteration, and the
//! reflected second minimum.

use nalgebra::{Matrix3, Point2, Vector3};

use marker_servo_core::homography_from_4pt;

/// One candidate rigid transform with its object-space error.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
    pub error: f64,
}

/// Project a matrix onto SO(3): R = U V^T with a sign correction so that
/// det(R) = +1.
fn project_to_so3(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    let svd = m.svd(true, true);
    let mut u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let flipped = -u.column(2).clone_owned();
        u.set_column(2, &flipped);
        r = u * v_t;
    }
    Some(r)
}

/// Initial pose from the model-plane -> normalized-image homography.
///
/// For points on the z = 0 plane, `H ~ [r1 r2 t]`; the rotation is completed
/// with `r3 = r1 x r2` and re-orthonormalized.
pub(crate) fn pose_from_homography(
    model: &[Point2<f64>; 4],
    rays: &[Vector3<f64>; 4],
) -> Option<Candidate> {
    let observed = [
        Point2::new(rays[0].x / rays[0].z, rays[0].y / rays[0].z),
        Point2::new(rays[1].x / rays[1].z, rays[1].y / rays[1].z),
        Point2::new(rays[2].x / rays[2].z, rays[2].y / rays[2].z),
        Point2::new(rays[3].x / rays[3].z, rays[3].y / rays[3].z),
    ];
    let h = homography_from_4pt(model, &observed)?.h;

    let mut c0 = h.column(0).into_owned();
    let mut c1 = h.column(1).into_owned();
    let mut c2 = h.column(2).into_owned();

    let scale = 0.5 * (c0.norm() + c1.norm());
    if scale < 1e-12 {
        return None;
    }
    c0 /= scale;
    c1 /= scale;
    c2 /= scale;

    // The marker must sit in front of the camera.
    if c2.z < 0.0 {
        c0 = -c0;
        c1 = -c1;
        c2 = -c2;
    }

    let c3 = c0.cross(&c1);
    let r_raw = Matrix3::from_columns(&[c0, c1, c3]);
    let rotation = project_to_so3(&r_raw)?;

    Some(Candidate {
        rotation,
        translation: c2,
        error: f64::MAX,
    })
}

/// Line-of-sight projection operators `F_i = v v^T / (v^T v)`.
fn sight_projectors(rays: &[Vector3<f64>; 4]) -> [Matrix3<f64>; 4] {
    let mut out = [Matrix3::zeros(); 4];
    for (f, v) in out.iter_mut().zip(rays) {
        *f = v * v.transpose() / v.dot(v);
    }
    out
}

fn object_space_error(
    f_ops: &[Matrix3<f64>; 4],
    rotation: &Matrix3<f64>,
    translation: &Vector3<f64>,
    model: &[Vector3<f64>; 4],
) -> f64 {
    let mut err = 0.0;
    for (f, p) in f_ops.iter().zip(model) {
        let q = rotation * p + translation;
        err += (q - f * q).norm_squared();
    }
    err
}

/// Orthogonal iteration (Lu, Hager, Mjolsness 2000) from an initial pose.
pub(crate) fn orthogonal_iteration(
    rays: &[Vector3<f64>; 4],
    model: &[Vector3<f64>; 4],
    init: &Candidate,
    iterations: usize,
) -> Option<Candidate> {
    let f_ops = sight_projectors(rays);

    let f_mean = f_ops.iter().sum::<Matrix3<f64>>() / 4.0;
    let t_solver = (Matrix3::identity() - f_mean).try_inverse()?;

    let p_mean = model.iter().sum::<Vector3<f64>>() / 4.0;
    let p_res: Vec<Vector3<f64>> = model.iter().map(|p| p - p_mean).collect();

    let mut rotation = init.rotation;
    let mut translation = init.translation;

    for _ in 0..iterations {
        // Optimal translation for the current rotation.
        let mut m = Vector3::zeros();
        for (f, p) in f_ops.iter().zip(model) {
            let rp = rotation * p;
            m += (f * rp - rp) / 4.0;
        }
        translation = t_solver * m;

        // Optimal rotation for the projected points.
        let mut q = [Vector3::zeros(); 4];
        let mut q_mean = Vector3::zeros();
        for (i, (f, p)) in f_ops.iter().zip(model).enumerate() {
            q[i] = f * (rotation * p + translation);
            q_mean += q[i] / 4.0;
        }

        let mut cross_cov = Matrix3::zeros();
        for (qi, pr) in q.iter().zip(&p_res) {
            cross_cov += (qi - q_mean) * pr.transpose();
        }
        rotation = project_to_so3(&cross_cov)?;
    }

    let error = object_space_error(&f_ops, &rotation, &translation, model);
    Some(Candidate {
        rotation,
        translation,
        error,
    })
}

/// Construct and refine the reflected second minimum (Schweighofer & Pinz
/// 2006): a ~180 degree rotation about the viewing axis through the marker.
///
/// Returns `None` when the reflection is too close to the first solution to
/// be a distinct minimum.
pub(crate) fn second_minimum(
    rays: &[Vector3<f64>; 4],
    model: &[Vector3<f64>; 4],
    first: &Candidate,
) -> Option<Candidate> {
    let t_norm = first.translation.norm();
    if t_norm < 1e-10 {
        return None;
    }
    let n = first.translation / t_norm;
    let reflect = 2.0 * n * n.transpose() - Matrix3::identity();
    let r2 = reflect * first.rotation;

    // Rotation angle between the two candidates, from the relative trace.
    let rel = first.rotation.transpose() * r2;
    let cos_angle = ((rel.trace() - 1.0) * 0.5).clamp(-1.0, 1.0);
    if cos_angle.acos() < 0.1 {
        return None;
    }

    let init = Candidate {
        rotation: r2,
        translation: first.translation,
        error: f64::MAX,
    };
    orthogonal_iteration(rays, model, &init, 50)
}

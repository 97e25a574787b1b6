//! Legacy flat CSV dump of raw particle physics state.

use crate::types::{Particle, Vec3};

const MISSING_VEC3: &str = "0,0,0";

pub const CSV_HEADER: &str = "id,groupId,shape,mass,pos_x,pos_y,pos_z,vel_x,vel_y,vel_z,rot_x,rot_y,rot_z,angVel_x,angVel_y,angVel_z";

/// Render particles as CSV, one row per particle, floats at 6 decimals.
///
/// A missing angular velocity is written as a bare `0` in each of its columns.
pub fn particles_to_csv(particles: &[Particle]) -> String {
    let mut csv = String::with_capacity((particles.len() + 1) * 160);
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for particle in particles {
        let angular_velocity = match &particle.angular_velocity {
            Some(v) => vec3_fields(v),
            None => MISSING_VEC3.to_string(),
        };
        csv.push_str(&format!(
            "{},{},{},{:.6},{},{},{},{}\n",
            escape_field(&particle.id.to_string()),
            escape_field(&particle.group_id.to_string()),
            escape_field(&particle.shape),
            particle.mass,
            vec3_fields(&particle.position),
            vec3_fields(&particle.velocity),
            vec3_fields(&particle.rotation),
            angular_velocity,
        ));
    }

    csv
}

fn vec3_fields(v: &Vec3) -> String {
    format!("{:.6},{:.6},{:.6}", v.x, v.y, v.z)
}

// Quote fields containing separators or quotes
fn escape_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

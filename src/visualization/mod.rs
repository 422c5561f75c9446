pub mod tbsim_vis2d;

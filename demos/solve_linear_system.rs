use rowreduce::{
    domains::rational::{Rational, Scalar},
    tensors::{matrix::Matrix, solve::Solution},
};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt, EnvFilter};

fn format_vector(v: &[Rational]) -> String {
    v.iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_system(system: &Matrix) {
    println!("Solve linear system in x\u{20D7}:");
    for r in system.row_iter() {
        let (lhs, rhs) = r.split_at(r.len() - 1);
        println!(
            "\t ({}).x\u{20D7} = {}",
            lhs.iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(","),
            rhs[0]
        );
    }
}

fn row_echelon() {
    let system = Matrix::from_scalars(vec![
        vec![2, 1, 3, 1],
        vec![3, 2, 1, 4],
        vec![1, -1, 2, 3],
    ])
    .unwrap();
    print_system(&system);

    let r = system.row_echelon().unwrap();
    println!("> Gaussian elimination:\n{}", r);

    match r.matrix.back_substitute() {
        Ok(x) => println!("x\u{20D7} = {{{}}}", format_vector(&x)),
        Err(e) => println!("Could not back substitute: {}", e),
    }
}

fn reduced_row_echelon() {
    let system = Matrix::from_scalars(vec![
        vec![Scalar::Integer(1), Scalar::Integer(2), Scalar::Decimal(0.5), Scalar::Integer(4)],
        vec![Scalar::Integer(2), Scalar::Integer(4), Scalar::Decimal(1.5), Scalar::Integer(9)],
    ])
    .unwrap();
    print_system(&system);

    let r = system.solve().unwrap();
    println!("> Gauss-Jordan elimination:\n{}", r.elimination);

    match r.solution {
        Solution::Unique(x) => println!("x\u{20D7} = {{{}}}", format_vector(&x)),
        Solution::Infinite {
            particular,
            free_variables,
        } => println!(
            "Infinitely many solutions, for example x\u{20D7} = {{{}}} with free variables {:?}",
            format_vector(&particular),
            free_variables
                .iter()
                .map(|i| format!("x{}", i + 1))
                .collect::<Vec<_>>()
        ),
        Solution::None => println!("The system has no solution"),
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("ROWREDUCE_LOG"))
        .init();

    row_echelon();
    reduced_row_echelon();
}
